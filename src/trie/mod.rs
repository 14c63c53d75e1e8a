// Trie module - THE RANKING
// Per-path competition between active claims and the cached winner of each path

mod index;
mod node;
mod path;

pub use index::{ClaimTrie, WinnerChange};
pub use node::{Candidate, TrieNode};
pub use path::TriePath;
