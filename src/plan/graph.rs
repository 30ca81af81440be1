// src/plan/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use tracing::debug;

use crate::delay::Delay;
use crate::errors::{Result, WavedagError};
use crate::plan::stage::{Link, Stage, StageId};

/// Immutable stage/link graph.
///
/// Stages and links keep their insertion order, and so do the per-stage
/// outgoing/incoming link lists. Cycles are allowed: the breadth-first
/// sequence numbers computed at build time are what the scheduler uses to
/// tell cycle-closing ("backward") links apart from forward ones.
#[derive(Debug, Clone)]
pub struct Plan<K> {
    title: String,
    stages: Vec<Stage<K>>,
    index: HashMap<StageId, usize>,
    links: Vec<Link>,
    outgoing: HashMap<StageId, Vec<Link>>,
    incoming: HashMap<StageId, Vec<Link>>,
    start: Vec<StageId>,
    /// Adjacency used for reachability and cycle reports.
    graph: DiGraphMap<StageId, ()>,
    sequence: HashMap<StageId, usize>,
}

impl<K> Plan<K> {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn stages(&self) -> &[Stage<K>] {
        &self.stages
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Stages every new plan run starts from. Never empty.
    pub fn start_set(&self) -> impl Iterator<Item = &Stage<K>> + '_ {
        self.start.iter().map(|id| self.stage_by_id(*id))
    }

    pub fn start_ids(&self) -> &[StageId] {
        &self.start
    }

    /// Links leaving `stage`, in insertion order.
    pub fn outgoings(&self, stage: StageId) -> &[Link] {
        self.outgoing
            .get(&stage)
            .map(|links| links.as_slice())
            .unwrap_or(&[])
    }

    /// Links entering `stage`, in insertion order.
    pub fn incomings(&self, stage: StageId) -> &[Link] {
        self.incoming
            .get(&stage)
            .map(|links| links.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_stage(&self, id: StageId) -> Option<&Stage<K>> {
        self.index.get(&id).map(|&i| &self.stages[i])
    }

    /// Look up a stage the caller knows to exist.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not part of the plan; callers are expected to only
    /// hold ids that came from this plan.
    pub fn stage_by_id(&self, id: StageId) -> &Stage<K> {
        match self.get_stage(id) {
            Some(stage) => stage,
            None => panic!("stage {id} is not part of plan '{}'", self.title),
        }
    }

    pub fn follow_to(&self, link: &Link) -> &Stage<K> {
        self.stage_by_id(link.to)
    }

    pub fn follow_from(&self, link: &Link) -> &Stage<K> {
        self.stage_by_id(link.from)
    }

    /// Breadth-first rank of every stage reachable from the start set.
    pub fn sequence_stages(&self) -> &HashMap<StageId, usize> {
        &self.sequence
    }

    pub fn sequence_of(&self, stage: StageId) -> Option<usize> {
        self.sequence.get(&stage).copied()
    }

    /// `true` when the link's target does not come strictly later than its
    /// source in breadth-first order.
    ///
    /// Links touching a stage without a rank (unreachable from the start set)
    /// count as forward.
    pub fn is_backward(&self, link: &Link) -> bool {
        match (self.sequence_of(link.from), self.sequence_of(link.to)) {
            (Some(from), Some(to)) => from >= to,
            _ => false,
        }
    }

    /// Immediate successors of a frontier, deduplicated, in the order the
    /// outgoing links are found.
    pub fn next_stages_breadth_first(&self, frontier: &[StageId]) -> Vec<StageId> {
        let mut seen = HashSet::new();
        let mut next = Vec::new();

        for &id in frontier {
            for link in self.outgoings(id) {
                if seen.insert(link.to) {
                    next.push(link.to);
                }
            }
        }

        next
    }

    /// `ids` plus every stage forward-reachable from them.
    pub fn reachable_from(&self, ids: &[StageId]) -> HashSet<StageId> {
        let mut reached: HashSet<StageId> = ids.iter().copied().collect();
        let mut dfs = Dfs::empty(&self.graph);

        for &id in ids {
            dfs.move_to(id);
            while let Some(node) = dfs.next(&self.graph) {
                reached.insert(node);
            }
        }

        reached
    }

    /// Groups of stages that sit on a cycle (including self-loops), each
    /// sorted by id.
    pub fn cycles(&self) -> Vec<Vec<StageId>> {
        let mut cycles: Vec<Vec<StageId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || self.graph.contains_edge(component[0], component[0])
            })
            .map(|mut component| {
                component.sort_unstable();
                component
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Flood forward from the start set, handing out one rank per stage in
    /// first-visit order.
    fn compute_sequence(&self) -> HashMap<StageId, usize> {
        let mut sequence = HashMap::new();
        let mut frontier = self.start.clone();

        while !frontier.is_empty() {
            let mut fresh = Vec::new();
            for id in frontier {
                if !sequence.contains_key(&id) {
                    let rank = sequence.len();
                    sequence.insert(id, rank);
                    fresh.push(id);
                }
            }
            frontier = self.next_stages_breadth_first(&fresh);
        }

        sequence
    }
}

/// Builder that validates the graph before handing out an immutable [`Plan`].
#[derive(Debug, Clone)]
pub struct PlanBuilder<K> {
    title: String,
    stages: Vec<Stage<K>>,
    links: Vec<Link>,
    start: Vec<StageId>,
}

impl<K> PlanBuilder<K> {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            stages: Vec::new(),
            links: Vec::new(),
            start: Vec::new(),
        }
    }

    pub fn stage(mut self, stage: Stage<K>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn link(self, from: StageId, to: StageId) -> Self {
        self.add_link(Link::new(from, to))
    }

    pub fn link_with_delay(self, from: StageId, to: StageId, delay: Delay) -> Self {
        self.add_link(Link::with_delay(from, to, delay))
    }

    pub fn add_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Mark a stage as part of the start set.
    ///
    /// When no stage is marked, the start set is every stage without
    /// incoming links.
    pub fn start(mut self, id: StageId) -> Self {
        if !self.start.contains(&id) {
            self.start.push(id);
        }
        self
    }

    pub fn build(self) -> Result<Plan<K>> {
        let mut index = HashMap::new();
        let mut graph = DiGraphMap::new();

        for (i, stage) in self.stages.iter().enumerate() {
            if index.insert(stage.id, i).is_some() {
                return Err(WavedagError::DuplicateStage(stage.id));
            }
            graph.add_node(stage.id);
        }

        let mut outgoing: HashMap<StageId, Vec<Link>> = HashMap::new();
        let mut incoming: HashMap<StageId, Vec<Link>> = HashMap::new();

        for link in self.links.iter() {
            for endpoint in [link.from, link.to] {
                if !index.contains_key(&endpoint) {
                    return Err(WavedagError::UnknownStage(endpoint));
                }
            }
            outgoing.entry(link.from).or_default().push(link.clone());
            incoming.entry(link.to).or_default().push(link.clone());
            graph.add_edge(link.from, link.to, ());
        }

        for id in self.start.iter() {
            if !index.contains_key(id) {
                return Err(WavedagError::UnknownStage(*id));
            }
        }

        let start = if self.start.is_empty() {
            self.stages
                .iter()
                .filter(|s| !incoming.contains_key(&s.id))
                .map(|s| s.id)
                .collect()
        } else {
            self.start
        };

        if start.is_empty() {
            return Err(WavedagError::EmptyStartSet(self.title));
        }

        let mut plan = Plan {
            title: self.title,
            stages: self.stages,
            index,
            links: self.links,
            outgoing,
            incoming,
            start,
            graph,
            sequence: HashMap::new(),
        };
        plan.sequence = plan.compute_sequence();

        debug!(
            plan = %plan.title,
            stages = plan.stages.len(),
            links = plan.links.len(),
            start = ?plan.start,
            "plan built"
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stages(builder: PlanBuilder<()>, ids: &[StageId]) -> PlanBuilder<()> {
        ids.iter()
            .fold(builder, |b, &id| b.stage(Stage::new(id, ())))
    }

    #[test]
    fn start_set_defaults_to_stages_without_incomings() {
        let plan = stages(PlanBuilder::new("p"), &[1, 2, 3, 4])
            .link(1, 2)
            .link(3, 2)
            .link(2, 4)
            .build()
            .unwrap();
        assert_eq!(plan.start_ids(), &[1, 3]);
        let ids: Vec<_> = plan.start_set().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn explicit_start_set_wins() {
        let plan = stages(PlanBuilder::new("p"), &[1, 2])
            .link(1, 2)
            .link(2, 1)
            .start(2)
            .build()
            .unwrap();
        assert_eq!(plan.start_ids(), &[2]);
    }

    #[test]
    fn build_rejects_bad_graphs() {
        let dup = stages(PlanBuilder::new("dup"), &[1, 1]).build();
        assert!(matches!(dup, Err(WavedagError::DuplicateStage(1))));

        let unknown = stages(PlanBuilder::new("unknown"), &[1]).link(1, 9).build();
        assert!(matches!(unknown, Err(WavedagError::UnknownStage(9))));

        let bad_start = stages(PlanBuilder::new("start"), &[1]).start(5).build();
        assert!(matches!(bad_start, Err(WavedagError::UnknownStage(5))));

        let ring = stages(PlanBuilder::new("ring"), &[1, 2])
            .link(1, 2)
            .link(2, 1)
            .build();
        assert!(matches!(ring, Err(WavedagError::EmptyStartSet(_))));
    }

    #[test]
    fn links_keep_insertion_order() {
        let plan = stages(PlanBuilder::new("p"), &[1, 2, 3, 4])
            .link(1, 4)
            .link(1, 2)
            .link(1, 3)
            .link_with_delay(2, 4, Delay::days(2))
            .build()
            .unwrap();
        let targets: Vec<_> = plan.outgoings(1).iter().map(|l| l.to).collect();
        assert_eq!(targets, vec![4, 2, 3]);
        let sources: Vec<_> = plan.incomings(4).iter().map(|l| l.from).collect();
        assert_eq!(sources, vec![1, 2]);
        assert_eq!(plan.incomings(4)[1].delay, Delay::days(2));
        assert!(plan.outgoings(4).is_empty());
        assert_eq!(plan.follow_to(&plan.outgoings(1)[0]).id, 4);
        assert_eq!(plan.follow_from(&plan.incomings(3)[0]).id, 1);
    }

    #[test]
    fn sequence_ranks_in_first_visit_order() {
        // 1 -> 2, 1 -> 3, 2 -> 3 (diamond cross edge), 3 -> 4, 4 -> 2 (cycle)
        let plan = stages(PlanBuilder::new("p"), &[1, 2, 3, 4, 5])
            .link(1, 2)
            .link(1, 3)
            .link(2, 3)
            .link(3, 4)
            .link(4, 2)
            .start(1)
            .build()
            .unwrap();

        let seq = plan.sequence_stages();
        assert_eq!(seq[&1], 0);
        assert_eq!(seq[&2], 1);
        assert_eq!(seq[&3], 2);
        assert_eq!(seq[&4], 3);
        assert!(!seq.contains_key(&5));

        let backward: Vec<(StageId, StageId)> = plan
            .links()
            .iter()
            .filter(|l| plan.is_backward(l))
            .map(|l| (l.from, l.to))
            .collect();
        assert_eq!(backward, vec![(4, 2)]);
    }

    #[test]
    fn self_loop_is_backward() {
        let plan = stages(PlanBuilder::new("p"), &[1, 2])
            .link(1, 2)
            .link(2, 2)
            .build()
            .unwrap();
        assert!(plan.is_backward(&Link::new(2, 2)));
        assert!(!plan.is_backward(&Link::new(1, 2)));
        assert_eq!(plan.cycles(), vec![vec![2]]);
    }

    #[test]
    fn next_stages_deduplicates_frontier() {
        let plan = stages(PlanBuilder::new("p"), &[1, 2, 3])
            .link(1, 3)
            .link(2, 3)
            .build()
            .unwrap();
        assert_eq!(plan.next_stages_breadth_first(&[1, 2]), vec![3]);
    }

    #[test]
    fn reachability_and_cycles() {
        let plan = stages(PlanBuilder::new("p"), &[1, 2, 3, 4, 5])
            .link(1, 2)
            .link(2, 3)
            .link(3, 2)
            .link(4, 5)
            .start(1)
            .build()
            .unwrap();
        let reached = plan.reachable_from(&[1]);
        assert_eq!(reached, [1, 2, 3].into_iter().collect());
        assert_eq!(plan.cycles(), vec![vec![2, 3]]);
    }

    #[test]
    #[should_panic(expected = "not part of plan")]
    fn unknown_stage_lookup_panics() {
        let plan = stages(PlanBuilder::new("p"), &[1]).build().unwrap();
        plan.stage_by_id(42);
    }
}
