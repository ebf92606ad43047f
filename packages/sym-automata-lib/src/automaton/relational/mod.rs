use anyhow::bail;
use itertools::Itertools;

use crate::{
    automaton::{
        Automaton, AutomatonId, AutomatonKind,
        bdd::Bit,
        counter::SymbolicCounter,
        dfa::{Dfa, builder::DfaBuilder},
        relational::{
            construct::{any_aligned, binary_relation, embed, normalize_padding, padding_chain},
            lambda::extract_track,
            relation::{RelationKind, StringRelation, TrackMap},
            track::{TrackHeuristic, TrackLayout},
            transition_table::RelationCache,
        },
        string::{StringAutomaton, VAR_PER_CHAR},
    },
    error::AutomatonError,
};

pub mod construct;
pub mod lambda;
pub mod relation;
pub mod track;
pub mod transition_table;

/// Simultaneous constraints over several string variables.
///
/// Each variable owns one track of an interleaved alphabet. Every accepted
/// word spells one string per track, each followed by padding, and ends in at
/// least one column where every track is padded. Constructions keep the
/// language closed under adding or removing such trailing columns, as long as
/// one remains.
#[derive(Debug)]
pub struct MultiTrackAutomaton {
    dfa: Dfa,
    tracks: TrackMap,
    relation: StringRelation,
    id: AutomatonId,
}

impl Clone for MultiTrackAutomaton {
    fn clone(&self) -> Self {
        MultiTrackAutomaton::new(self.dfa.clone(), self.tracks.clone(), self.relation.clone())
    }
}

impl Automaton for MultiTrackAutomaton {
    fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    fn kind(&self) -> AutomatonKind {
        AutomatonKind::MultiTrack
    }

    fn id(&self) -> AutomatonId {
        self.id
    }

    fn is_cyclic(&self) -> bool {
        self.without_padding().is_cyclic()
    }

    /// Counts tuples of strings: the trailing padding columns are not part of
    /// the counted words.
    fn symbolic_counter(&self) -> SymbolicCounter {
        SymbolicCounter::from_dfa(&self.without_padding(), self.kind())
    }
}

impl MultiTrackAutomaton {
    pub fn new(dfa: Dfa, tracks: TrackMap, relation: StringRelation) -> Self {
        assert_eq!(
            dfa.num_vars(),
            tracks.num_tracks() * VAR_PER_CHAR,
            "Alphabet does not match {} tracks",
            tracks.num_tracks()
        );
        MultiTrackAutomaton {
            dfa,
            tracks,
            relation,
            id: AutomatonId::fresh(),
        }
    }

    pub fn layout(&self) -> TrackLayout {
        TrackLayout::new(self.tracks.num_tracks())
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.num_tracks()
    }

    pub fn tracks(&self) -> &TrackMap {
        &self.tracks
    }

    pub fn relation(&self) -> &StringRelation {
        &self.relation
    }

    pub fn into_dfa(self) -> Dfa {
        self.dfa
    }

    pub fn make_phi(tracks: TrackMap) -> Self {
        let layout = TrackLayout::new(tracks.num_tracks());
        let dfa = Dfa::phi(layout.num_vars());
        let result = MultiTrackAutomaton::new(dfa, tracks, StringRelation::Phi);
        tracing::debug!("{} = makePhi({})", result.id, result.tracks);
        result
    }

    /// Every word over the interleaved alphabet, padded or not.
    pub fn make_any_string_unaligned(tracks: TrackMap) -> Self {
        let layout = TrackLayout::new(tracks.num_tracks());
        let dfa = Dfa::universe(layout.num_vars());
        let result = MultiTrackAutomaton::new(dfa, tracks, StringRelation::Any);
        tracing::debug!("{} = makeAnyStringUnaligned({})", result.id, result.tracks);
        result
    }

    /// Every tuple of strings.
    pub fn make_any_string_aligned(tracks: TrackMap) -> Self {
        let layout = TrackLayout::new(tracks.num_tracks());
        let result = MultiTrackAutomaton::new(any_aligned(layout), tracks, StringRelation::Any);
        tracing::debug!("{} = makeAnyStringAligned({})", result.id, result.tracks);
        result
    }

    /// Puts the strings of `auto` on `track`, leaving the other tracks free.
    pub fn from_string_automaton(auto: &StringAutomaton, track: usize, tracks: TrackMap) -> Self {
        let layout = TrackLayout::new(tracks.num_tracks());
        let dfa = embed(auto.dfa(), track, layout).intersect(&any_aligned(layout));
        let relation = StringRelation::var(tracks.name(track));
        let result = MultiTrackAutomaton::new(dfa, tracks, relation);
        tracing::debug!("{} = [{}]->embed({})", result.id, auto.id(), track);
        result
    }

    /// Builds the automaton of `relation` over `tracks`, memoizing relation
    /// building blocks in the process wide cache.
    pub fn make_automaton(relation: &StringRelation, tracks: TrackMap) -> anyhow::Result<Self> {
        Self::make_automaton_with(relation, tracks, RelationCache::global())
    }

    pub fn make_automaton_with(
        relation: &StringRelation,
        tracks: TrackMap,
        cache: &RelationCache,
    ) -> anyhow::Result<Self> {
        let span = tracing::span!(tracing::Level::DEBUG, "make_automaton");
        let _enter = span.enter();

        let dfa = relation_dfa(relation, &tracks, cache)?;
        let result = MultiTrackAutomaton::new(dfa, tracks, relation.clone());
        tracing::debug!("{} = makeAutomaton({})", result.id, relation);
        Ok(result)
    }

    fn derive(
        &self,
        op: &str,
        other: Option<&MultiTrackAutomaton>,
        dfa: Dfa,
        relation: StringRelation,
    ) -> Self {
        let result = MultiTrackAutomaton::new(dfa, self.tracks.clone(), relation);
        match other {
            Some(other) => tracing::debug!("{} = [{}]->{}({})", result.id, self.id, op, other.id),
            None => tracing::debug!("{} = [{}]->{}()", result.id, self.id, op),
        }
        result
    }

    fn check_tracks(&self, other: &MultiTrackAutomaton) -> anyhow::Result<()> {
        if self.num_tracks() != other.num_tracks() {
            bail!(AutomatonError::TrackCountMismatch {
                left: self.num_tracks(),
                right: other.num_tracks(),
            });
        }
        Ok(())
    }

    /// Negation restricted to well formed words.
    pub fn complement(&self) -> Self {
        let dfa = self.dfa.negate().intersect(&any_aligned(self.layout()));
        self.derive("complement", None, dfa, self.relation.clone().negate())
    }

    pub fn union(&self, other: &MultiTrackAutomaton) -> anyhow::Result<Self> {
        self.check_tracks(other)?;
        let relation = self.relation.clone().or(other.relation.clone());
        Ok(self.derive("union", Some(other), self.dfa.union(&other.dfa), relation))
    }

    pub fn intersect(&self, other: &MultiTrackAutomaton) -> anyhow::Result<Self> {
        self.check_tracks(other)?;
        let relation = self.relation.clone().and(other.relation.clone());
        Ok(self.derive("intersect", Some(other), self.dfa.intersect(&other.dfa), relation))
    }

    pub fn difference(&self, other: &MultiTrackAutomaton) -> anyhow::Result<Self> {
        self.check_tracks(other)?;
        let relation = self.relation.clone().and(other.relation.clone().negate());
        Ok(self.derive("difference", Some(other), self.dfa.difference(&other.dfa), relation))
    }

    /// Restricts the track of `var` to the strings of `auto`.
    pub fn intersect_string(&self, auto: &StringAutomaton, var: &str) -> anyhow::Result<Self> {
        let track = self.tracks.track_of(var)?;
        let dfa = self.dfa.intersect(&embed(auto.dfa(), track, self.layout()));
        let result = MultiTrackAutomaton::new(dfa, self.tracks.clone(), self.relation.clone());
        tracing::debug!("{} = [{}]->intersectString({}, {})", result.id, self.id, auto.id(), var);
        Ok(result)
    }

    /// Existentially quantifies track `k`. The later tracks move down by one.
    pub fn project_k_track(&self, k: usize) -> anyhow::Result<Self> {
        if self.num_tracks() < 2 {
            bail!(AutomatonError::Unsupported("projecting away the only track".to_string()));
        }
        let layout = self.layout();
        let narrow = TrackLayout::new(layout.num_tracks() - 1);

        let dfa = remove_tracks(&self.dfa, layout, &[k]);
        let dfa = normalize_padding(&dfa, narrow);
        let result = MultiTrackAutomaton::new(dfa, self.tracks.without(k), self.relation.clone());
        tracing::debug!("{} = [{}]->projectKTrack({})", result.id, self.id, k);
        Ok(result)
    }

    pub fn project_away_variable(&self, name: &str) -> anyhow::Result<Self> {
        let track = self.tracks.track_of(name)?;
        self.project_k_track(track)
    }

    /// The strings that appear on track `k` of an accepted word.
    pub fn get_k_track(&self, k: usize) -> StringAutomaton {
        let result = extract_track(&self.dfa, k, self.layout());
        tracing::debug!("{} = [{}]->getKTrack({})", result.id(), self.id, k);
        result
    }

    pub fn get_automaton_for_variable(&self, name: &str) -> anyhow::Result<StringAutomaton> {
        let track = self.tracks.track_of(name)?;
        Ok(self.get_k_track(track))
    }

    /// One accepted tuple, a string per track in track order.
    pub fn get_an_accepting_string_for_each_track(&self) -> Option<Vec<String>> {
        let layout = self.layout();
        self.dfa
            .accepting_word(&TrackHeuristic::new(layout))
            .map(|word| {
                layout
                    .decode(&word)
                    .iter()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .collect()
            })
    }

    /// Whether the tuple `tracks`, one string per track, is accepted.
    pub fn accepts_tracks(&self, tracks: &[&[u8]]) -> bool {
        self.dfa.accepts(&self.layout().encode(tracks))
    }

    pub fn check_equivalence(&self, other: &MultiTrackAutomaton) -> bool {
        self.num_tracks() == other.num_tracks() && self.dfa.is_equal(&other.dfa)
    }

    /// The automaton without its trailing padding columns. A state accepts if
    /// one or more padding columns lead to acceptance, and the padding column
    /// itself is rejected.
    fn without_padding(&self) -> Dfa {
        let num_vars = self.dfa.num_vars();
        let sink = self.dfa.state_count();
        let padding = vec![Bit::One; num_vars];

        let mut builder = DfaBuilder::new(sink + 1, num_vars);
        let mut accepting = Vec::with_capacity(sink + 1);
        for state in 0..self.dfa.state_count() {
            builder.store_exception(sink, padding.clone());
            for (pattern, target) in self.dfa.paths(state) {
                builder.store_exception(target, pattern);
            }
            builder.store_state(sink);
            accepting.push(
                padding_chain(&self.dfa, state)
                    .iter()
                    .any(|s| self.dfa.is_accepting(*s)),
            );
        }
        builder.store_state(sink);
        accepting.push(false);

        builder.build_with(&accepting).with_start(self.dfa.start())
    }
}

/// Quantifies the bits of `removed` and renumbers the remaining tracks.
fn remove_tracks(dfa: &Dfa, layout: TrackLayout, removed: &[usize]) -> Dfa {
    let mut result = dfa.clone();
    for track in removed.iter().sorted().rev() {
        for bit in 0..VAR_PER_CHAR {
            result = result.project(layout.var(*track, bit));
        }
    }

    let kept = (0..layout.num_tracks())
        .filter(|t| !removed.contains(t))
        .collect_vec();
    let narrow = TrackLayout::new(kept.len());
    let map = (0..layout.num_vars())
        .map(|var| {
            let (track, bit) = (var % layout.num_tracks(), var / layout.num_tracks());
            kept.iter()
                .position(|t| *t == track)
                .map(|new_track| narrow.var(new_track, bit))
        })
        .collect_vec();
    result.replace_indices(&map, narrow.num_vars())
}

fn relation_dfa(
    relation: &StringRelation,
    tracks: &TrackMap,
    cache: &RelationCache,
) -> anyhow::Result<Dfa> {
    if tracks.num_tracks() == 0 {
        bail!(AutomatonError::UnsupportedRelation(format!("{} over no tracks", relation)));
    }
    let layout = TrackLayout::new(tracks.num_tracks());

    match relation {
        StringRelation::Compare { kind, left, right } => {
            compare_dfa(*kind, left, right, tracks, cache)
        }
        StringRelation::Intersect(parts) => parts
            .iter()
            .try_fold(any_aligned(layout), |dfa, part| {
                Ok(dfa.intersect(&relation_dfa(part, tracks, cache)?))
            }),
        StringRelation::Union(parts) => parts
            .iter()
            .try_fold(Dfa::phi(layout.num_vars()), |dfa, part| {
                Ok(dfa.union(&relation_dfa(part, tracks, cache)?))
            }),
        StringRelation::Not(inner) => Ok(relation_dfa(inner, tracks, cache)?
            .negate()
            .intersect(&any_aligned(layout))),
        StringRelation::Any => Ok(any_aligned(layout)),
        StringRelation::Phi => Ok(Dfa::phi(layout.num_vars())),
        StringRelation::Var(_) | StringRelation::Constant(_) | StringRelation::Regex(_) => {
            bail!(AutomatonError::UnsupportedRelation(relation.to_string()))
        }
    }
}

/// Resolves an operand to a track. Constants and regexes get an auxiliary
/// track after the variable tracks.
fn operand_track(
    operand: &StringRelation,
    tracks: &TrackMap,
    aux: &mut Vec<StringAutomaton>,
) -> anyhow::Result<usize> {
    let auto = match operand {
        StringRelation::Var(name) => return tracks.track_of(name),
        StringRelation::Constant(text) => StringAutomaton::make_string(text),
        StringRelation::Regex(pattern) => StringAutomaton::make_regex(pattern)?,
        other => bail!(AutomatonError::UnsupportedRelation(other.to_string())),
    };
    aux.push(auto);
    Ok(tracks.num_tracks() + aux.len() - 1)
}

fn compare_dfa(
    kind: RelationKind,
    left: &StringRelation,
    right: &StringRelation,
    tracks: &TrackMap,
    cache: &RelationCache,
) -> anyhow::Result<Dfa> {
    let mut aux = vec![];
    let left = operand_track(left, tracks, &mut aux)?;
    let right = operand_track(right, tracks, &mut aux)?;
    let layout = TrackLayout::new(tracks.num_tracks());

    if left == right {
        return Ok(if kind.is_reflexive() {
            any_aligned(layout)
        } else {
            Dfa::phi(layout.num_vars())
        });
    }

    let wide = TrackLayout::new(tracks.num_tracks() + aux.len());
    let dfa = aux.iter().enumerate().fold(
        binary_relation(cache, kind, wide, left, right).intersect(&any_aligned(wide)),
        |dfa, (i, auto)| dfa.intersect(&embed(auto.dfa(), tracks.num_tracks() + i, wide)),
    );
    if aux.is_empty() {
        return Ok(dfa);
    }

    let removed = (tracks.num_tracks()..wide.num_tracks()).collect_vec();
    Ok(normalize_padding(&remove_tracks(&dfa, wide, &removed), layout))
}
