// Sentence-aligned chunking with word overlap
use crate::nlp::Analyzer;

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Greedy sentence packer.
///
/// A chunk goes over `chunk_size` words only when it is a single over-long
/// sentence or the overlap seed plus the one sentence that overflowed it;
/// consecutive chunks share a tail of whole sentences worth roughly
/// `overlap` words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartChunker {
    chunk_size: usize,
    overlap: usize,
}

impl SmartChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Segment `text` with `analyzer` and pack the sentences
    pub fn chunk(&self, analyzer: &dyn Analyzer, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let sentences = analyzer.sentences(text);
        self.pack(&sentences)
    }

    /// Pack pre-segmented sentences into overlapping chunks
    pub fn pack<S: AsRef<str>>(&self, sentences: &[S]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut words = 0;

        for sentence in sentences {
            let sentence = sentence.as_ref().trim();
            let count = word_count(sentence);
            if count == 0 {
                continue;
            }

            if !buffer.is_empty() && words + count > self.chunk_size {
                chunks.push(buffer.join(" "));

                let (seed, seed_words) = self.overlap_seed(&buffer, count);
                buffer = seed;
                words = seed_words;
            }

            buffer.push(sentence);
            words += count;
        }

        if !buffer.is_empty() {
            chunks.push(buffer.join(" "));
        }
        chunks
    }

    /// Trailing sentences of `emitted` worth `overlap` words; empty when the
    /// next sentence alone exceeds `chunk_size`
    fn overlap_seed<'a>(&self, emitted: &[&'a str], next_words: usize) -> (Vec<&'a str>, usize) {
        if next_words > self.chunk_size {
            return (Vec::new(), 0);
        }

        let mut seed: Vec<&str> = Vec::new();
        let mut seed_words = 0;
        for sentence in emitted.iter().rev() {
            if seed_words >= self.overlap {
                break;
            }
            seed.push(sentence);
            seed_words += word_count(sentence);
        }
        seed.reverse();
        (seed, seed_words)
    }
}

impl Default for SmartChunker {
    fn default() -> Self {
        Self::new(300, 50)
    }
}
