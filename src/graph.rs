/*!

  Derived analyses over a circuit: the feedback detector and the petgraph
  export.

*/

use crate::circuit::{GateId, NetId};
use crate::netlist::Circuit;
use log::{debug, warn};
#[cfg(feature = "graph")]
use petgraph::graph::DiGraph;
use std::collections::HashMap;

/// A common trait of analyses that can be performed on a circuit.
/// Analyses are read-only views; they become stale if the circuit's
/// measures are recomputed.
pub trait Analysis<'a>
where
    Self: Sized + 'a,
{
    /// Constructs the analysis from the current state of the circuit.
    fn build(circuit: &'a Circuit) -> Result<Self, String>;
}

/// One combinational-feedback diagnosis: a gate whose output cannot sit
/// strictly above all of its inputs in level order.
#[derive(Debug, Clone)]
pub struct FeedbackArc {
    /// The gate on the feedback path.
    pub gate: GateId,
    /// The offending input net.
    pub input: NetId,
    /// Level of the offending input, if the leveler assigned one.
    pub input_level: Option<u32>,
    /// The gate's output net.
    pub output: NetId,
    /// Level of the output net, if the leveler assigned one.
    pub output_level: Option<u32>,
}

/// Reports combinational feedback after levelization.
///
/// Two rules contribute. A levelized gate is flagged when some input's
/// level strictly exceeds its output's level (a multi-driver artifact).
/// An unlevelized gate is flagged when it lies on a cycle of unlevelized
/// gates: a true combinational loop starves the leveler's input counters,
/// so the loop never receives levels at all.
///
/// Informational, never fatal; metrics through flagged gates stay at
/// infinity.
pub struct FeedbackReport<'a> {
    circuit: &'a Circuit,
    arcs: Vec<FeedbackArc>,
}

impl FeedbackReport<'_> {
    /// The diagnosed feedback arcs, one per offending gate.
    pub fn arcs(&self) -> &[FeedbackArc] {
        &self.arcs
    }

    /// Number of gates diagnosed with combinational feedback.
    pub fn count(&self) -> usize {
        self.arcs.len()
    }

    /// Returns `true` if no combinational feedback was found.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// The circuit this report was built over.
    pub fn circuit(&self) -> &Circuit {
        self.circuit
    }
}

impl<'a> Analysis<'a> for FeedbackReport<'a> {
    fn build(circuit: &'a Circuit) -> Result<Self, String> {
        let mut arcs = Vec::new();

        // Rule 1: an assigned output level below an input's level.
        for (id, gate) in circuit.gates() {
            let output = gate.output();
            let Some(out_level) = circuit.net(output).level() else {
                continue;
            };
            for &input in gate.inputs() {
                let in_level = circuit.net(input).level();
                if in_level.is_some_and(|l| l > out_level) {
                    arcs.push(FeedbackArc {
                        gate: id,
                        input,
                        input_level: in_level,
                        output,
                        output_level: Some(out_level),
                    });
                    break;
                }
            }
        }

        // Rule 2: cycles among the gates the leveler never drained.
        for (gate, input) in cyclic_unlevelized_gates(circuit) {
            let output = circuit.gate(gate).output();
            arcs.push(FeedbackArc {
                gate,
                input,
                input_level: circuit.net(input).level(),
                output,
                output_level: circuit.net(output).level(),
            });
        }

        for arc in &arcs {
            warn!(
                "feedback detected: gate {}, input {} (level {:?}) -> output {} (level {:?})",
                circuit.gate(arc.gate),
                circuit.net(arc.input),
                arc.input_level,
                circuit.net(arc.output),
                arc.output_level,
            );
        }
        debug!("{} combinational feedback arc(s) detected", arcs.len());

        Ok(FeedbackReport { circuit, arcs })
    }
}

/// Finds unlevelized gates that sit on a cycle of unlevelized gates, paired
/// with the input net that ties them into the cycle.
fn cyclic_unlevelized_gates(circuit: &Circuit) -> Vec<(GateId, NetId)> {
    let nodes: Vec<GateId> = circuit
        .gates()
        .filter(|(_, g)| circuit.net(g.output()).level().is_none())
        .map(|(id, _)| id)
        .collect();
    if nodes.is_empty() {
        return Vec::new();
    }
    let pos: HashMap<GateId, usize> = nodes.iter().enumerate().map(|(i, &g)| (g, i)).collect();

    // Edges follow the data: u -> v when u's output feeds an input of v.
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (u, &gate) in nodes.iter().enumerate() {
        let output = circuit.gate(gate).output();
        for &load in circuit.net(output).loads() {
            if let Some(&v) = pos.get(&load) {
                adj[u].push(v);
            }
        }
    }

    let comp = strongly_connected_components(&adj);
    let mut comp_size = vec![0usize; nodes.len()];
    for &c in &comp {
        comp_size[c] += 1;
    }

    let mut cyclic = Vec::new();
    for (u, &gate) in nodes.iter().enumerate() {
        let in_cycle = comp_size[comp[u]] > 1 || adj[u].contains(&u);
        if !in_cycle {
            continue;
        }
        // The offending input is the first one driven from inside the
        // same component.
        let offending = circuit.gate(gate).inputs().iter().copied().find(|&input| {
            circuit.net(input).drivers().iter().any(|driver| {
                pos.get(driver)
                    .is_some_and(|&v| comp[v] == comp[u])
            })
        });
        if let Some(input) = offending {
            cyclic.push((gate, input));
        }
    }
    cyclic
}

/// Iterative Tarjan; returns the component index of every node.
fn strongly_connected_components(adj: &[Vec<usize>]) -> Vec<usize> {
    let n = adj.len();
    let mut index = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut comp = vec![usize::MAX; n];
    let mut stack = Vec::new();
    let mut next_index = 0usize;
    let mut comp_count = 0usize;

    for start in 0..n {
        if index[start] != usize::MAX {
            continue;
        }
        let mut work = vec![(start, 0usize)];
        while let Some((v, child)) = work.pop() {
            if child == 0 {
                index[v] = next_index;
                low[v] = next_index;
                next_index += 1;
                stack.push(v);
                on_stack[v] = true;
            }
            let mut descended = false;
            for i in child..adj[v].len() {
                let w = adj[v][i];
                if index[w] == usize::MAX {
                    work.push((v, i + 1));
                    work.push((w, 0));
                    descended = true;
                    break;
                }
                if on_stack[w] {
                    low[v] = low[v].min(index[w]);
                }
            }
            if descended {
                continue;
            }
            if low[v] == index[v] {
                loop {
                    let w = stack.pop().expect("Tarjan stack underflow");
                    on_stack[w] = false;
                    comp[w] = comp_count;
                    if w == v {
                        break;
                    }
                }
                comp_count += 1;
            }
            if let Some(&(parent, _)) = work.last() {
                low[parent] = low[parent].min(low[v]);
            }
        }
    }
    comp
}

/// A node in the exported multigraph.
#[cfg(feature = "graph")]
#[derive(Debug, Clone)]
pub enum Node {
    /// A combinational gate instance.
    Gate(String),
    /// A flip-flop instance.
    FlipFlop(String),
    /// A primary-input pseudo-node.
    Input(String),
    /// A primary-output pseudo-node.
    Output(String),
}

#[cfg(feature = "graph")]
impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Gate(label) | Node::FlipFlop(label) => write!(f, "{}", label),
            Node::Input(name) => write!(f, "Input({})", name),
            Node::Output(name) => write!(f, "Output({})", name),
        }
    }
}

/// A petgraph rendition of the circuit as a directed multigraph, with
/// gates and flip-flops as nodes, IO as pseudo-nodes, and one edge per
/// driver-to-load connection labeled with the net name.
#[cfg(feature = "graph")]
pub struct MultiDiGraph<'a> {
    _circuit: &'a Circuit,
    graph: DiGraph<Node, String>,
}

#[cfg(feature = "graph")]
impl MultiDiGraph<'_> {
    /// Returns a reference to the constructed graph.
    pub fn get_graph(&self) -> &DiGraph<Node, String> {
        &self.graph
    }
}

#[cfg(feature = "graph")]
impl<'a> Analysis<'a> for MultiDiGraph<'a> {
    fn build(circuit: &'a Circuit) -> Result<Self, String> {
        use crate::circuit::NetRole;
        use petgraph::graph::NodeIndex;

        let mut graph = DiGraph::new();

        // Every net maps to the nodes that drive it.
        let mut drivers_of: HashMap<NetId, Vec<NodeIndex>> = HashMap::new();

        let gate_nodes: Vec<NodeIndex> = circuit
            .gates()
            .map(|(_, gate)| {
                let node = graph.add_node(Node::Gate(gate.to_string()));
                drivers_of.entry(gate.output()).or_default().push(node);
                node
            })
            .collect();

        let ff_nodes: Vec<NodeIndex> = circuit
            .flip_flops()
            .map(|(_, ff)| {
                let node = graph.add_node(Node::FlipFlop(ff.to_string()));
                if let Some(q) = ff.q() {
                    drivers_of.entry(q).or_default().push(node);
                }
                node
            })
            .collect();

        for (id, net) in circuit.nets() {
            if net.role() == NetRole::PrimaryInput {
                let node = graph.add_node(Node::Input(net.name().to_string()));
                drivers_of.entry(id).or_default().push(node);
            }
        }

        let connect = |graph: &mut DiGraph<Node, String>, net: NetId, to: NodeIndex| {
            if let Some(sources) = drivers_of.get(&net) {
                for &source in sources {
                    graph.add_edge(source, to, circuit.net(net).name().to_string());
                }
            }
        };

        for (id, gate) in circuit.gates() {
            for &input in gate.inputs() {
                connect(&mut graph, input, gate_nodes[id.index()]);
            }
        }
        for (id, ff) in circuit.flip_flops() {
            for port in [ff.clk(), ff.d(), ff.t(), ff.j(), ff.k(), ff.s(), ff.r()]
                .into_iter()
                .flatten()
            {
                connect(&mut graph, port, ff_nodes[id.index()]);
            }
        }
        for (id, net) in circuit.nets() {
            if net.role() == NetRole::PrimaryOutput {
                let node = graph.add_node(Node::Output(net.name().to_string()));
                connect(&mut graph, id, node);
            }
        }

        Ok(Self {
            _circuit: circuit,
            graph,
        })
    }
}
