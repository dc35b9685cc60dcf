//! Size-based content splitting. Chunk boundaries are character offsets
//! only; the chunker knows nothing about lines, tokens, or syntax.

use crate::types::Chunk;

/// Split `content` into chunks of at most `max_chunk_size` characters.
///
/// Never returns an empty sequence: an empty file yields one empty chunk,
/// so every file gets at least one review attempt and therefore a status.
/// A `max_chunk_size` of zero is clamped to one character; config
/// validation rejects it before a scan gets this far.
pub fn split(content: &str, max_chunk_size: usize) -> Vec<Chunk> {
    let size = max_chunk_size.max(1);
    let mut pieces: Vec<String> = Vec::new();
    let mut chars = content.chars().peekable();

    while chars.peek().is_some() {
        let piece: String = chars.by_ref().take(size).collect();
        pieces.push(piece);
    }

    if pieces.is_empty() {
        pieces.push(String::new());
    }

    let total = pieces.len();
    return pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| return Chunk { index, text, total })
        .collect();
}
