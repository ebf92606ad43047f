use itertools::Itertools;

use crate::automaton::{
    bdd::Bit,
    dfa::witness::WitnessHeuristic,
    string::{LAMBDA, VAR_PER_CHAR, bits_to_char, char_bits, char_pattern, pick_char},
};

/// Interleaved bit layout of a multi-track alphabet. Bit `j` of track `i`
/// is variable `i + num_tracks * j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackLayout {
    num_tracks: usize,
}

impl TrackLayout {
    pub fn new(num_tracks: usize) -> Self {
        assert!(num_tracks > 0, "A multi-track alphabet needs at least one track");
        TrackLayout { num_tracks }
    }

    pub fn num_tracks(&self) -> usize {
        self.num_tracks
    }

    pub fn num_vars(&self) -> usize {
        self.num_tracks * VAR_PER_CHAR
    }

    pub fn var(&self, track: usize, bit: usize) -> usize {
        track + self.num_tracks * bit
    }

    /// A pattern constraining nothing.
    pub fn wildcard(&self) -> Vec<Bit> {
        vec![Bit::Any; self.num_vars()]
    }

    /// Writes a character pattern into `track`.
    pub fn set(&self, pattern: &mut [Bit], track: usize, chars: &[Bit]) {
        for (bit, value) in chars.iter().enumerate() {
            pattern[self.var(track, bit)] = *value;
        }
    }

    pub fn set_lambda(&self, pattern: &mut [Bit], track: usize) {
        self.set(pattern, track, &char_pattern(LAMBDA));
    }

    /// A pattern with the given tracks fixed and the others free.
    pub fn pattern(&self, tracks: &[(usize, &[Bit])]) -> Vec<Bit> {
        let mut pattern = self.wildcard();
        for (track, chars) in tracks {
            self.set(&mut pattern, *track, chars);
        }
        pattern
    }

    /// The pattern of `track` inside a full pattern.
    pub fn track_pattern(&self, pattern: &[Bit], track: usize) -> Vec<Bit> {
        (0..VAR_PER_CHAR)
            .map(|bit| pattern[self.var(track, bit)])
            .collect()
    }

    pub fn track_char(&self, symbol: &[bool], track: usize) -> u8 {
        let bits = (0..VAR_PER_CHAR)
            .map(|bit| symbol[self.var(track, bit)])
            .collect_vec();
        bits_to_char(&bits)
    }

    /// Splits a word into one byte string per track, dropping the padding.
    pub fn decode(&self, word: &[Vec<bool>]) -> Vec<Vec<u8>> {
        (0..self.num_tracks)
            .map(|track| {
                word.iter()
                    .map(|symbol| self.track_char(symbol, track))
                    .take_while(|c| *c != LAMBDA)
                    .collect()
            })
            .collect()
    }

    /// Pads every track to a common length plus one trailing padding symbol.
    pub fn encode(&self, tracks: &[&[u8]]) -> Vec<Vec<bool>> {
        assert_eq!(tracks.len(), self.num_tracks);
        let length = tracks.iter().map(|t| t.len()).max().unwrap_or(0) + 1;

        (0..length)
            .map(|step| {
                let mut symbol = vec![false; self.num_vars()];
                for (track, text) in tracks.iter().enumerate() {
                    let c = text.get(step).copied().unwrap_or(LAMBDA);
                    for (bit, value) in char_bits(c).into_iter().enumerate() {
                        symbol[self.var(track, bit)] = value;
                    }
                }
                symbol
            })
            .collect()
    }
}

/// Picks printable characters on every track independently.
#[derive(Debug, Clone, Copy)]
pub struct TrackHeuristic {
    layout: TrackLayout,
}

impl TrackHeuristic {
    pub fn new(layout: TrackLayout) -> Self {
        TrackHeuristic { layout }
    }
}

impl WitnessHeuristic for TrackHeuristic {
    fn concretize(&self, pattern: &[Bit]) -> Vec<bool> {
        let mut symbol = pattern.iter().map(|b| *b == Bit::One).collect_vec();
        for track in 0..self.layout.num_tracks() {
            let chars = self.layout.track_pattern(pattern, track);
            if let Some(c) = pick_char(&chars) {
                for (bit, value) in char_bits(c).into_iter().enumerate() {
                    symbol[self.layout.var(track, bit)] = value;
                }
            }
        }
        symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleaving() {
        let layout = TrackLayout::new(3);
        assert_eq!(layout.num_vars(), 24);
        assert_eq!(layout.var(0, 0), 0);
        assert_eq!(layout.var(2, 0), 2);
        assert_eq!(layout.var(1, 7), 22);
    }

    #[test]
    fn test_encode_decode() {
        let layout = TrackLayout::new(2);
        let word = layout.encode(&[b"ab", b""]);
        assert_eq!(word.len(), 3);
        assert_eq!(layout.decode(&word), vec![b"ab".to_vec(), vec![]]);
    }
}
