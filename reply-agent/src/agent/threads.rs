//! Conversation reconstruction
//!
//! Turns one flat search result into per-author threads. A reply survives
//! only if the tweet it answers is in the same fetch and was written by the
//! same author, so every thread is a single-author chain back to a root.

use crate::twitter::{Post, RawSearchResult, ReferenceKind};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Ordered single-author thread within one conversation (oldest first)
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub author_id: String,
    pub conversation_id: String,
    pub posts: Vec<Post>,
}

impl Conversation {
    pub fn first(&self) -> &Post {
        &self.posts[0]
    }

    pub fn last(&self) -> &Post {
        &self.posts[self.posts.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn author_name(&self) -> &str {
        &self.first().author_name
    }

    /// Prompt rendering: one `@user: text` line per tweet.
    pub fn render(&self) -> String {
        self.posts
            .iter()
            .map(|p| format!("@{}: {}", p.author_name, p.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// All conversations of one author, in order of first appearance
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorConversations {
    pub author_id: String,
    pub conversations: Vec<Conversation>,
}

/// author_id → conversation_id → Conversation, insertion ordered
#[derive(Debug, Clone, Default)]
pub struct ConversationIndex {
    authors: Vec<AuthorConversations>,
    positions: HashMap<String, usize>,
}

impl ConversationIndex {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    pub fn conversation_count(&self) -> usize {
        self.authors.iter().map(|a| a.conversations.len()).sum()
    }

    pub fn authors(&self) -> impl Iterator<Item = &AuthorConversations> {
        self.authors.iter()
    }

    /// Every conversation, authors first, then conversations within each author.
    pub fn conversations(&self) -> impl Iterator<Item = &Conversation> {
        self.authors.iter().flat_map(|a| a.conversations.iter())
    }

    #[cfg(test)]
    pub fn get(&self, author_id: &str, conversation_id: &str) -> Option<&Conversation> {
        let idx = *self.positions.get(author_id)?;
        self.authors[idx]
            .conversations
            .iter()
            .find(|c| c.conversation_id == conversation_id)
    }

    fn insert(&mut self, conversation: Conversation) {
        let idx = match self.positions.get(&conversation.author_id) {
            Some(idx) => *idx,
            None => {
                self.authors.push(AuthorConversations {
                    author_id: conversation.author_id.clone(),
                    conversations: Vec::new(),
                });
                let idx = self.authors.len() - 1;
                self.positions.insert(conversation.author_id.clone(), idx);
                idx
            }
        };
        self.authors[idx].conversations.push(conversation);
    }
}

/// Numeric order for snowflake ids, lexicographic otherwise.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// Whether `post` may start or continue a single-author thread.
fn continues_thread(post: &Post, by_id: &HashMap<&str, &Post>) -> bool {
    let Some(reference) = post.first_reference() else {
        return true;
    };

    // Quotes and retweets don't break continuity
    if reference.kind != ReferenceKind::RepliedTo {
        return true;
    }

    match by_id.get(reference.id.as_str()) {
        Some(parent) if parent.author_id == post.author_id => true,
        Some(parent) => {
            log::debug!(
                "[AGENT] Discarding tweet {}: replies to {} by another author ({})",
                post.id,
                parent.id,
                parent.author_id
            );
            false
        }
        None => {
            log::debug!(
                "[AGENT] Discarding tweet {}: parent {} not in this fetch",
                post.id,
                reference.id
            );
            false
        }
    }
}

/// Group a flat search result into per-author, per-conversation threads.
pub fn reconstruct(result: &RawSearchResult) -> ConversationIndex {
    let by_id: HashMap<&str, &Post> = result.posts.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut groups: Vec<Conversation> = Vec::new();
    let mut group_positions: HashMap<(&str, &str), usize> = HashMap::new();

    for post in result.posts.iter().filter(|p| continues_thread(p, &by_id)) {
        let key = (post.author_id.as_str(), post.conversation_id.as_str());
        match group_positions.get(&key) {
            Some(&idx) => groups[idx].posts.push(post.clone()),
            None => {
                group_positions.insert(key, groups.len());
                groups.push(Conversation {
                    author_id: post.author_id.clone(),
                    conversation_id: post.conversation_id.clone(),
                    posts: vec![post.clone()],
                });
            }
        }
    }

    let mut index = ConversationIndex::default();
    for mut conversation in groups {
        conversation.posts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| compare_ids(&a.id, &b.id))
        });
        index.insert(conversation);
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{post, search_result};
    use crate::twitter::types::ReferencedPost;

    #[test]
    fn test_empty_result_gives_empty_index() {
        let index = reconstruct(&RawSearchResult::default());
        assert!(index.is_empty());
        assert_eq!(index.conversation_count(), 0);
    }

    #[test]
    fn test_same_author_thread_is_ordered() {
        // API returns newest first
        let result = search_result(vec![
            post("3", "a", "c1", 20, Some("2")),
            post("2", "a", "c1", 10, Some("1")),
            post("1", "a", "c1", 0, None),
        ]);
        let index = reconstruct(&result);

        assert_eq!(index.author_count(), 1);
        let conversation = index.get("a", "c1").unwrap();
        let ids: Vec<&str> = conversation.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(conversation.first().id, "1");
        assert_eq!(conversation.last().id, "3");
    }

    #[test]
    fn test_reply_to_other_author_is_discarded() {
        let result = search_result(vec![
            post("1", "a", "c1", 0, None),
            post("2", "a", "c1", 5, Some("1")),
            post("3", "b", "c1", 10, Some("2")),
        ]);
        let index = reconstruct(&result);

        assert_eq!(index.author_count(), 1);
        let ids: Vec<&str> = index
            .get("a", "c1")
            .unwrap()
            .posts
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(index.get("b", "c1").is_none());
    }

    #[test]
    fn test_reply_to_missing_parent_is_discarded() {
        let result = search_result(vec![post("2", "a", "c1", 5, Some("404"))]);
        assert!(reconstruct(&result).is_empty());
    }

    #[test]
    fn test_quote_and_retweet_references_are_roots() {
        let mut quote = post("10", "a", "c10", 0, None);
        quote.referenced_posts = vec![ReferencedPost {
            kind: ReferenceKind::Quoted,
            id: "999".to_string(),
        }];
        let mut retweet = post("11", "b", "c11", 0, None);
        retweet.referenced_posts = vec![ReferencedPost {
            kind: ReferenceKind::Retweeted,
            id: "998".to_string(),
        }];

        let index = reconstruct(&search_result(vec![quote, retweet]));
        assert_eq!(index.conversation_count(), 2);
        assert!(index.get("a", "c10").is_some());
        assert!(index.get("b", "c11").is_some());
    }

    #[test]
    fn test_only_first_reference_is_inspected() {
        let mut p = post("2", "a", "c1", 5, None);
        p.referenced_posts = vec![
            ReferencedPost {
                kind: ReferenceKind::Quoted,
                id: "777".to_string(),
            },
            ReferencedPost {
                kind: ReferenceKind::RepliedTo,
                id: "404".to_string(),
            },
        ];
        assert_eq!(reconstruct(&search_result(vec![p])).conversation_count(), 1);
    }

    #[test]
    fn test_ties_broken_by_numeric_id() {
        let result = search_result(vec![
            post("100", "a", "c1", 0, None),
            post("99", "a", "c1", 0, None),
        ]);
        let index = reconstruct(&result);
        let ids: Vec<&str> = index
            .conversations()
            .next()
            .unwrap()
            .posts
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["99", "100"]);
    }

    #[test]
    fn test_insertion_order_follows_first_appearance() {
        let result = search_result(vec![
            post("5", "b", "c5", 50, None),
            post("4", "a", "c4", 40, None),
            post("3", "b", "c3", 30, None),
        ]);
        let index = reconstruct(&result);

        let authors: Vec<&str> = index.authors().map(|a| a.author_id.as_str()).collect();
        assert_eq!(authors, vec!["b", "a"]);
        let conversations: Vec<&str> = index
            .conversations()
            .map(|c| c.conversation_id.as_str())
            .collect();
        assert_eq!(conversations, vec!["c5", "c3", "c4"]);
    }

    #[test]
    fn test_every_conversation_is_single_author_and_sorted() {
        let result = search_result(vec![
            post("1", "a", "c1", 30, None),
            post("2", "b", "c1", 10, Some("1")),
            post("3", "a", "c1", 20, Some("1")),
            post("4", "b", "c2", 5, None),
            post("5", "b", "c2", 1, Some("4")),
            post("6", "a", "c2", 7, Some("5")),
        ]);
        let index = reconstruct(&result);

        for author in index.authors() {
            for conversation in &author.conversations {
                assert!(conversation.posts.iter().all(|p| p.author_id == author.author_id));
                assert!(
                    conversation
                        .posts
                        .windows(2)
                        .all(|w| w[0].created_at <= w[1].created_at)
                );
            }
        }
        // "2" and "6" reply across authors
        let kept: Vec<&str> = index
            .conversations()
            .flat_map(|c| c.posts.iter().map(|p| p.id.as_str()))
            .collect();
        assert!(!kept.contains(&"2"));
        assert!(!kept.contains(&"6"));
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_render_lists_tweets_in_order() {
        let result = search_result(vec![
            post("2", "a", "c1", 10, Some("1")),
            post("1", "a", "c1", 0, None),
        ]);
        let index = reconstruct(&result);
        let rendered = index.conversations().next().unwrap().render();
        assert_eq!(rendered, "@user_a: tweet 1\n@user_a: tweet 2");
    }
}
