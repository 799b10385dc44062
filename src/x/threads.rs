//! Reply discovery: turn a flat conversation into threads awaiting an answer.

use std::collections::{HashMap, HashSet};

use crate::core::models::{Reply, ReplyThread};

/// One post from a conversation search, with the id of the post it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTweet {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub created_at: Option<String>,
    pub in_reply_to: Option<String>,
}

impl From<&ConversationTweet> for Reply {
    fn from(tweet: &ConversationTweet) -> Self {
        Reply {
            id: tweet.id.clone(),
            text: tweet.text.clone(),
            author_id: tweet.author_id.clone(),
            created_at: tweet.created_at.clone(),
        }
    }
}

/// Group a conversation under `post_id` into threads that need a response.
///
/// A thread ends at each reply from someone other than `author_id` that
/// `author_id` has not answered. Answers from third parties do not count, so a
/// reply and a third-party follow-up to it each get their own thread. A thread
/// holds every ancestor of its pending reply below the original post, oldest
/// first. Threads are ordered by when their pending reply was written.
#[must_use]
pub fn assemble_threads(
    post_id: &str,
    author_id: &str,
    tweets: &[ConversationTweet],
) -> Vec<ReplyThread> {
    let by_id: HashMap<&str, &ConversationTweet> =
        tweets.iter().map(|t| (t.id.as_str(), t)).collect();
    let answered: HashSet<&str> = tweets
        .iter()
        .filter(|t| t.author_id == author_id)
        .filter_map(|t| t.in_reply_to.as_deref())
        .collect();

    let mut pending: Vec<&ConversationTweet> = tweets
        .iter()
        .filter(|t| t.id != post_id && t.author_id != author_id)
        .filter(|t| !answered.contains(t.id.as_str()))
        .collect();
    pending.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    pending
        .into_iter()
        .map(|leaf| {
            let mut chain = vec![Reply::from(leaf)];
            let mut seen = HashSet::from([leaf.id.as_str()]);
            let mut parent = leaf.in_reply_to.as_deref();

            while let Some(id) = parent {
                if id == post_id || !seen.insert(id) {
                    break;
                }
                let Some(tweet) = by_id.get(id) else { break };
                chain.push(Reply::from(*tweet));
                parent = tweet.in_reply_to.as_deref();
            }

            chain.reverse();
            ReplyThread::new(chain)
        })
        .collect()
}
