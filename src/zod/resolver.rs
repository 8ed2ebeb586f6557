//! Dependency resolution between generated schemas
//!
//! Declarations are resolved by repeated passes in source order: a
//! declaration is ready once every tracked dependency has been resolved.
//! Self-references are allowed and produce a lazily resolved schema;
//! anything left after `max_run` passes is reported as unresolved.

use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Resolved,
    /// Depends on itself and has to be wrapped in `z.lazy`
    LazilyResolved,
    Unresolved,
}

/// Graph node for one in-scope declaration
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyNode<'a> {
    pub name: &'a str,
    pub dependencies: &'a [String],
    /// Constructs with no schema counterpart; never resolved when non-empty
    pub unsupported: &'a [String],
}

/// Outcome for a single declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Position of the declaration in the input slice
    pub index: usize,
    pub name: String,
    pub state: ResolutionState,
    /// Zero-based pass the declaration was resolved in
    pub pass: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    /// Resolved and lazily resolved declarations, in emission order,
    /// followed by the unresolved ones in source order
    pub resolutions: Vec<Resolution>,
    /// Unresolved declarations grouped by the cycle that blocks them, in
    /// the order of their errors
    pub unresolved_groups: Vec<Vec<String>>,
    pub errors: Vec<String>,
}

impl GenerationResult {
    pub fn emitted(&self) -> impl Iterator<Item = &Resolution> {
        self.resolutions
            .iter()
            .filter(|r| r.state != ResolutionState::Unresolved)
    }

    pub fn state_of(&self, name: &str) -> Option<ResolutionState> {
        self.resolutions
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.state)
    }
}

pub const DEFAULT_MAX_RUN: usize = 10;

/// Order the nodes so that every schema follows its dependencies.
///
/// Dependencies naming something that is not a node (filtered out, or not
/// declared at all) are assumed to exist already and never block.
pub fn resolve(nodes: &[DependencyNode<'_>], max_run: usize) -> GenerationResult {
    let max_run = max_run.max(1);
    let tracked: HashSet<&str> = nodes.iter().map(|n| n.name).collect();
    let mut resolved: HashSet<&str> = HashSet::new();
    let mut states: Vec<Option<(ResolutionState, usize)>> = vec![None; nodes.len()];
    let mut order = Vec::new();

    let candidates = nodes.iter().filter(|n| n.unsupported.is_empty()).count();

    for pass in 0..max_run {
        let mut progressed = false;

        for (index, node) in nodes.iter().enumerate() {
            if states[index].is_some() || !node.unsupported.is_empty() {
                continue;
            }

            let blocked = node.dependencies.iter().any(|d| {
                d != node.name && tracked.contains(d.as_str()) && !resolved.contains(d.as_str())
            });
            if blocked {
                continue;
            }

            let state = if node.dependencies.iter().any(|d| d == node.name) {
                ResolutionState::LazilyResolved
            } else {
                ResolutionState::Resolved
            };
            debug!("Pass {}: {} is {:?}", pass + 1, node.name, state);

            states[index] = Some((state, pass));
            resolved.insert(node.name);
            order.push(index);
            progressed = true;
        }

        if !progressed || order.len() == candidates {
            break;
        }
    }

    let mut result = GenerationResult::default();
    for &index in &order {
        if let Some((state, pass)) = states[index] {
            result.resolutions.push(Resolution {
                index,
                name: nodes[index].name.to_string(),
                state,
                pass: Some(pass),
            });
        }
    }

    let unresolved: Vec<usize> = (0..nodes.len())
        .filter(|&i| states[i].is_none())
        .collect();
    for &index in &unresolved {
        result.resolutions.push(Resolution {
            index,
            name: nodes[index].name.to_string(),
            state: ResolutionState::Unresolved,
            pass: None,
        });
    }

    for &index in &unresolved {
        let node = &nodes[index];
        if !node.unsupported.is_empty() {
            let error = format!(
                "{} can't be generated: unsupported {}",
                node.name,
                node.unsupported.join(", ")
            );
            warn!("{}", error);
            result.errors.push(error);
        }
    }

    let blocked: Vec<usize> = unresolved
        .into_iter()
        .filter(|&i| nodes[i].unsupported.is_empty())
        .collect();
    for group in group_unresolved(nodes, &blocked) {
        let names: Vec<String> = group
            .members
            .iter()
            .map(|&i| nodes[i].name.to_string())
            .collect();
        let error = group_error(nodes, &group, &names);
        warn!("{}", error.replace('\n', " "));
        result.errors.push(error);
        result.unresolved_groups.push(names);
    }

    info!(
        "Resolved {} of {} declarations ({} unresolved)",
        result.emitted().count(),
        nodes.len(),
        nodes.len() - result.emitted().count()
    );

    result
}

/// Unresolved declarations reported together under one error
struct UnresolvedGroup {
    /// Indices into the node list, in declaration order
    members: Vec<usize>,
    circular: bool,
}

/// Split the unresolved subgraph into groups: one per dependency cycle, with
/// every blocked dependent attached to the first cycle it reaches. Dependents
/// that reach no cycle are grouped with their unresolved neighbours.
fn group_unresolved(nodes: &[DependencyNode<'_>], blocked: &[usize]) -> Vec<UnresolvedGroup> {
    let local: HashMap<&str, usize> = blocked
        .iter()
        .enumerate()
        .map(|(l, &i)| (nodes[i].name, l))
        .collect();
    let edges: Vec<Vec<usize>> = blocked
        .iter()
        .enumerate()
        .map(|(l, &i)| {
            nodes[i]
                .dependencies
                .iter()
                .filter_map(|d| local.get(d.as_str()).copied())
                .filter(|&target| target != l)
                .collect()
        })
        .collect();

    let mut cycles: Vec<Vec<usize>> = strongly_connected_components(&edges)
        .into_iter()
        .filter(|component| component.len() > 1)
        .collect();
    cycles.sort_by_key(|cycle| cycle[0]);

    let mut cycle_of = vec![None; blocked.len()];
    for (group, cycle) in cycles.iter().enumerate() {
        for &member in cycle {
            cycle_of[member] = Some(group);
        }
    }

    let mut groups: Vec<UnresolvedGroup> = cycles
        .iter()
        .map(|_| UnresolvedGroup {
            members: Vec::new(),
            circular: true,
        })
        .collect();
    let mut leftovers = Vec::new();
    for l in 0..blocked.len() {
        let group = cycle_of[l].or_else(|| first_reachable_cycle(l, &edges, &cycle_of));
        match group {
            Some(group) => groups[group].members.push(l),
            None => leftovers.push(l),
        }
    }

    groups.extend(
        weakly_connected(&leftovers, &edges)
            .into_iter()
            .map(|members| UnresolvedGroup {
                members,
                circular: false,
            }),
    );

    for group in &mut groups {
        for member in &mut group.members {
            *member = blocked[*member];
        }
        group.members.sort_unstable();
    }
    groups.sort_by_key(|group| group.members[0]);
    groups
}

/// Tarjan's algorithm; every component comes back sorted
fn strongly_connected_components(edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    struct Tarjan<'g> {
        edges: &'g [Vec<usize>],
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        next_index: usize,
        components: Vec<Vec<usize>>,
    }

    impl Tarjan<'_> {
        fn connect(&mut self, v: usize) {
            self.index[v] = Some(self.next_index);
            self.lowlink[v] = self.next_index;
            self.next_index += 1;
            self.stack.push(v);
            self.on_stack[v] = true;

            let edges = self.edges;
            for &w in &edges[v] {
                match self.index[w] {
                    None => {
                        self.connect(w);
                        self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                    }
                    Some(index) if self.on_stack[w] => {
                        self.lowlink[v] = self.lowlink[v].min(index);
                    }
                    Some(_) => {}
                }
            }

            if self.index[v] == Some(self.lowlink[v]) {
                let mut component = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                component.sort_unstable();
                self.components.push(component);
            }
        }
    }

    let mut tarjan = Tarjan {
        edges,
        index: vec![None; edges.len()],
        lowlink: vec![0; edges.len()],
        on_stack: vec![false; edges.len()],
        stack: Vec::new(),
        next_index: 0,
        components: Vec::new(),
    };
    for v in 0..edges.len() {
        if tarjan.index[v].is_none() {
            tarjan.connect(v);
        }
    }
    tarjan.components
}

fn first_reachable_cycle(
    start: usize,
    edges: &[Vec<usize>],
    cycle_of: &[Option<usize>],
) -> Option<usize> {
    let mut seen = HashSet::new();
    let mut stack = vec![start];
    let mut first = None;
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        if let Some(group) = cycle_of[current] {
            first = Some(first.map_or(group, |f: usize| f.min(group)));
            continue;
        }
        stack.extend(edges[current].iter().copied());
    }
    first
}

/// Undirected components of the subgraph induced by `members`
fn weakly_connected(members: &[usize], edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let inside: HashSet<usize> = members.iter().copied().collect();
    let mut neighbours: HashMap<usize, Vec<usize>> = HashMap::new();
    for &from in members {
        for &to in &edges[from] {
            if inside.contains(&to) {
                neighbours.entry(from).or_default().push(to);
                neighbours.entry(to).or_default().push(from);
            }
        }
    }

    let mut seen = HashSet::new();
    let mut groups = Vec::new();
    for &start in members {
        if !seen.insert(start) {
            continue;
        }
        let mut group = vec![start];
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            for &next in neighbours.get(&current).into_iter().flatten() {
                if seen.insert(next) {
                    group.push(next);
                    stack.push(next);
                }
            }
        }
        groups.push(group);
    }
    groups
}

fn group_error(nodes: &[DependencyNode<'_>], group: &UnresolvedGroup, names: &[String]) -> String {
    let reason = if group.circular {
        "circular dependencies"
    } else if group.members.iter().any(|&i| {
        nodes[i]
            .dependencies
            .iter()
            .any(|d| is_unsupported(nodes, d))
    }) {
        "dependencies on unsupported declarations"
    } else {
        "too many resolution passes (raise maxRun)"
    };

    format!(
        "Some schemas can't be generated due to {}:\n{}",
        reason,
        names.join("\n")
    )
}

fn is_unsupported(nodes: &[DependencyNode<'_>], name: &str) -> bool {
    nodes
        .iter()
        .any(|n| n.name == name && !n.unsupported.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        name: &'static str,
        dependencies: Vec<String>,
        unsupported: Vec<String>,
    }

    fn fixture(name: &'static str, dependencies: &[&str]) -> Fixture {
        Fixture {
            name,
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            unsupported: Vec::new(),
        }
    }

    fn nodes(fixtures: &[Fixture]) -> Vec<DependencyNode<'_>> {
        fixtures
            .iter()
            .map(|f| DependencyNode {
                name: f.name,
                dependencies: &f.dependencies,
                unsupported: &f.unsupported,
            })
            .collect()
    }

    fn emitted_names(result: &GenerationResult) -> Vec<&str> {
        result.emitted().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let fixtures = vec![
            fixture("BadassSuperman", &["Superman"]),
            fixture("Superman", &["Name"]),
            fixture("Name", &[]),
        ];
        let result = resolve(&nodes(&fixtures), DEFAULT_MAX_RUN);

        assert_eq!(emitted_names(&result), vec!["Name", "Superman", "BadassSuperman"]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_resolution_is_visible_within_a_pass() {
        let fixtures = vec![fixture("A", &[]), fixture("B", &["A"]), fixture("C", &["B"])];
        let result = resolve(&nodes(&fixtures), 1);

        assert_eq!(emitted_names(&result), vec!["A", "B", "C"]);
        assert!(result.resolutions.iter().all(|r| r.pass == Some(0)));
    }

    #[test]
    fn test_self_reference_is_lazy() {
        let fixtures = vec![fixture("Vilain", &["Vilain"])];
        let result = resolve(&nodes(&fixtures), DEFAULT_MAX_RUN);

        assert_eq!(result.state_of("Vilain"), Some(ResolutionState::LazilyResolved));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_mutual_cycle_is_one_error() {
        let fixtures = vec![
            fixture("EvilPlan", &["EvilPlanDetails"]),
            fixture("EvilPlanDetails", &["EvilPlan"]),
            fixture("Standalone", &[]),
        ];
        let result = resolve(&nodes(&fixtures), DEFAULT_MAX_RUN);

        assert_eq!(emitted_names(&result), vec!["Standalone"]);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("circular dependencies"));
        assert!(result.errors[0].contains("EvilPlan\nEvilPlanDetails"));
        assert_eq!(
            result.unresolved_groups,
            vec![vec!["EvilPlan".to_string(), "EvilPlanDetails".to_string()]]
        );
    }

    #[test]
    fn test_dependents_join_the_cycle_group() {
        let fixtures = vec![
            fixture("User", &["Cycle1"]),
            fixture("Cycle1", &["Cycle2"]),
            fixture("Cycle2", &["Cycle1"]),
            fixture("Other1", &["Other2"]),
            fixture("Other2", &["Other1"]),
        ];
        let result = resolve(&nodes(&fixtures), DEFAULT_MAX_RUN);

        assert!(emitted_names(&result).is_empty());
        assert_eq!(result.unresolved_groups.len(), 2);
        assert_eq!(
            result.unresolved_groups[0],
            vec!["User".to_string(), "Cycle1".to_string(), "Cycle2".to_string()]
        );
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_shared_dependent_keeps_cycles_apart() {
        let fixtures = vec![
            fixture("User", &["Cycle1", "Other1"]),
            fixture("Cycle1", &["Cycle2"]),
            fixture("Cycle2", &["Cycle1"]),
            fixture("Other1", &["Other2"]),
            fixture("Other2", &["Other1"]),
            fixture("Admin", &["User"]),
        ];
        let result = resolve(&nodes(&fixtures), DEFAULT_MAX_RUN);

        assert_eq!(
            result.unresolved_groups,
            vec![
                vec![
                    "User".to_string(),
                    "Cycle1".to_string(),
                    "Cycle2".to_string(),
                    "Admin".to_string(),
                ],
                vec!["Other1".to_string(), "Other2".to_string()],
            ]
        );
        assert_eq!(result.errors.len(), 2);
        assert!(result
            .errors
            .iter()
            .all(|e| e.starts_with("Some schemas can't be generated due to circular dependencies")));
    }

    #[test]
    fn test_untracked_dependencies_do_not_block() {
        let fixtures = vec![fixture("Hero", &["Filtered", "Unknown"])];
        let result = resolve(&nodes(&fixtures), DEFAULT_MAX_RUN);

        assert_eq!(result.state_of("Hero"), Some(ResolutionState::Resolved));
    }

    #[test]
    fn test_unsupported_blocks_dependents() {
        let mut broken = fixture("Broken", &[]);
        broken.unsupported = vec!["keyof type operator".to_string()];
        let fixtures = vec![broken, fixture("User", &["Broken"]), fixture("Fine", &[])];
        let result = resolve(&nodes(&fixtures), DEFAULT_MAX_RUN);

        assert_eq!(emitted_names(&result), vec!["Fine"]);
        assert_eq!(result.state_of("Broken"), Some(ResolutionState::Unresolved));
        assert_eq!(result.state_of("User"), Some(ResolutionState::Unresolved));
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("Broken can't be generated: unsupported keyof"));
        assert!(result.errors[1].contains("unsupported declarations"));
    }

    #[test]
    fn test_max_run_bounds_the_passes() {
        // Declared in reverse, each pass resolves exactly one node
        let fixtures = vec![fixture("C", &["B"]), fixture("B", &["A"]), fixture("A", &[])];

        let result = resolve(&nodes(&fixtures), 2);
        assert_eq!(emitted_names(&result), vec!["A", "B"]);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("maxRun"));

        let result = resolve(&nodes(&fixtures), 0);
        assert_eq!(emitted_names(&result), vec!["A"]);
    }
}
