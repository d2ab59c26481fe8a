// ============================================================
// Layer 3 — Reserved Tokens
// ============================================================
// Every vocabulary in the system (the definition vocabulary,
// the conditioning vocabulary, and any vocabulary restored
// from disk) must agree on the four control tokens and their
// ids, otherwise persisted files and pretrained-vector keying
// stop being interchangeable.
//
// They live in one immutable value, SPECIALS, rather than in
// four loose globals.
//
//   id  word     meaning
//   0   <pad>    padding beyond a sequence's true length
//   1   <unk>    any token the vocabulary has never seen
//   2   <bos>    start of sequence
//   3   <eos>    end of sequence (appended to every target)

/// Integer id of a token inside a vocabulary.
pub type TokenId = u32;

/// The four control tokens shared by every vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub pad: &'static str,
    pub unk: &'static str,
    pub bos: &'static str,
    pub eos: &'static str,
}

impl SpecialTokens {
    pub const PAD: TokenId = 0;
    pub const UNK: TokenId = 1;
    pub const BOS: TokenId = 2;
    pub const EOS: TokenId = 3;

    /// Number of ids reserved before the first corpus token
    pub const COUNT: usize = 4;

    /// Reserved words in id order, so `words()[id]` is the word for `id`
    pub const fn words(&self) -> [&'static str; Self::COUNT] {
        [self.pad, self.unk, self.bos, self.eos]
    }
}

/// The single reserved-token configuration used by the whole crate.
pub const SPECIALS: SpecialTokens = SpecialTokens {
    pad: "<pad>",
    unk: "<unk>",
    bos: "<bos>",
    eos: "<eos>",
};
