/*!

  The circuit container and the incremental builder that external netlist
  parsers drive.

*/

use crate::circuit::{
    FlipFlop, FlipFlopId, FlipFlopKind, Gate, GateId, GateKind, Net, NetId, NetRole, PortBindings,
};
use crate::graph::Analysis;
use log::warn;
use std::collections::{HashMap, HashSet};

/// An error raised while assembling a circuit. Builder-phase errors are
/// fatal to the analysis pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Two gates or two flip-flops share an instance name.
    #[error("duplicate instance name `{0}`")]
    DuplicateInstance(String),
    /// A gate's input count is incompatible with its kind.
    #[error("gate `{instance}` of kind `{kind}` takes {expected} inputs, got {got}")]
    Arity {
        /// The offending instance name.
        instance: String,
        /// The gate kind whose arity rule was violated.
        kind: GateKind,
        /// Human-readable description of the accepted input count.
        expected: String,
        /// The input count that was supplied.
        got: usize,
    },
}

fn arity_text(kind: GateKind) -> String {
    match kind.input_arity() {
        (min, Some(max)) if min == max => format!("exactly {}", min),
        (min, Some(max)) => format!("between {} and {}", min, max),
        (min, None) => format!("at least {}", min),
    }
}

/// An immutable gate-level circuit: nets, gates, and flip-flops in arenas,
/// cross-referenced by index.
///
/// Construction goes through [`CircuitBuilder`]; after [`CircuitBuilder::finish`]
/// the topology is frozen and the analysis engines only write the per-net
/// SCOAP measure fields.
#[derive(Debug)]
pub struct Circuit {
    name: String,
    pub(crate) nets: Vec<Net>,
    pub(crate) gates: Vec<Gate>,
    pub(crate) flipflops: Vec<FlipFlop>,
    net_index: HashMap<String, NetId>,
    inputs: Vec<NetId>,
    outputs: Vec<NetId>,
}

impl Circuit {
    /// Returns the name of the circuit module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the net behind `id`.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.0]
    }

    pub(crate) fn net_mut(&mut self, id: NetId) -> &mut Net {
        &mut self.nets[id.0]
    }

    /// Returns the gate behind `id`.
    pub fn gate(&self, id: GateId) -> &Gate {
        &self.gates[id.0]
    }

    /// Returns the flip-flop behind `id`.
    pub fn flip_flop(&self, id: FlipFlopId) -> &FlipFlop {
        &self.flipflops[id.0]
    }

    /// Looks up a net by name.
    pub fn find_net(&self, name: &str) -> Option<NetId> {
        self.net_index.get(name).copied()
    }

    /// Iterates over all nets with their ids, in declaration order.
    pub fn nets(&self) -> impl Iterator<Item = (NetId, &Net)> {
        self.nets.iter().enumerate().map(|(i, n)| (NetId(i), n))
    }

    /// Iterates over all gates with their ids, in declaration order.
    pub fn gates(&self) -> impl Iterator<Item = (GateId, &Gate)> {
        self.gates.iter().enumerate().map(|(i, g)| (GateId(i), g))
    }

    /// Iterates over all flip-flops with their ids, in declaration order.
    pub fn flip_flops(&self) -> impl Iterator<Item = (FlipFlopId, &FlipFlop)> {
        self.flipflops
            .iter()
            .enumerate()
            .map(|(i, ff)| (FlipFlopId(i), ff))
    }

    /// Primary-input nets in declaration order.
    pub fn primary_inputs(&self) -> &[NetId] {
        &self.inputs
    }

    /// Primary-output nets in declaration order.
    pub fn primary_outputs(&self) -> &[NetId] {
        &self.outputs
    }

    /// Number of nets in the circuit.
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Number of combinational gates in the circuit.
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Number of flip-flops in the circuit.
    pub fn flip_flop_count(&self) -> usize {
        self.flipflops.len()
    }

    /// Constructs an analysis over the circuit.
    pub fn get_analysis<'a, A: Analysis<'a>>(&'a self) -> Result<A, String> {
        A::build(self)
    }
}

/// Incrementally assembles a [`Circuit`] from declarations fed in by an
/// external netlist parser.
///
/// Any net referenced before it is declared is created as an internal wire;
/// a later `input`/`output` declaration upgrades its role.
#[derive(Debug)]
pub struct CircuitBuilder {
    name: String,
    nets: Vec<Net>,
    gates: Vec<Gate>,
    flipflops: Vec<FlipFlop>,
    net_index: HashMap<String, NetId>,
    inputs: Vec<NetId>,
    outputs: Vec<NetId>,
    gate_names: HashSet<String>,
    ff_names: HashSet<String>,
}

impl CircuitBuilder {
    /// Creates an empty builder for a module called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nets: Vec::new(),
            gates: Vec::new(),
            flipflops: Vec::new(),
            net_index: HashMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            gate_names: HashSet::new(),
            ff_names: HashSet::new(),
        }
    }

    fn ensure_net(&mut self, name: &str) -> NetId {
        if let Some(&id) = self.net_index.get(name) {
            return id;
        }
        let id = NetId(self.nets.len());
        self.nets.push(Net::new(name.to_string()));
        self.net_index.insert(name.to_string(), id);
        id
    }

    fn set_role(&mut self, id: NetId, role: NetRole) {
        let old = self.nets[id.0].role;
        if old == role {
            return;
        }
        match old {
            NetRole::PrimaryInput => self.inputs.retain(|&n| n != id),
            NetRole::PrimaryOutput => self.outputs.retain(|&n| n != id),
            NetRole::Wire => {}
        }
        self.nets[id.0].role = role;
        match role {
            NetRole::PrimaryInput => self.inputs.push(id),
            NetRole::PrimaryOutput => self.outputs.push(id),
            NetRole::Wire => {}
        }
    }

    /// Declares a primary-input net.
    pub fn declare_input(&mut self, name: &str) -> NetId {
        let id = self.ensure_net(name);
        self.set_role(id, NetRole::PrimaryInput);
        id
    }

    /// Declares a primary-output net.
    pub fn declare_output(&mut self, name: &str) -> NetId {
        let id = self.ensure_net(name);
        self.set_role(id, NetRole::PrimaryOutput);
        id
    }

    /// Declares an internal wire.
    pub fn declare_wire(&mut self, name: &str) -> NetId {
        self.ensure_net(name)
    }

    /// Adds a combinational gate instance.
    ///
    /// `kind` is the netlist keyword; a keyword outside the closed set is
    /// accepted with a warning, and the resulting gate is skipped by the
    /// engines. Input nets are given in port order.
    pub fn add_gate(
        &mut self,
        kind: &str,
        instance: &str,
        output: &str,
        inputs: &[&str],
    ) -> Result<GateId, BuildError> {
        if !self.gate_names.insert(instance.to_string()) {
            return Err(BuildError::DuplicateInstance(instance.to_string()));
        }
        let parsed = GateKind::parse(kind);
        match parsed {
            Some(k) => {
                if !k.accepts_inputs(inputs.len()) {
                    self.gate_names.remove(instance);
                    return Err(BuildError::Arity {
                        instance: instance.to_string(),
                        kind: k,
                        expected: arity_text(k),
                        got: inputs.len(),
                    });
                }
            }
            None => {
                warn!(
                    "gate `{}` has unknown kind `{}` and will not propagate measures",
                    instance, kind
                );
            }
        }

        let id = GateId(self.gates.len());
        let output = self.ensure_net(output);
        self.nets[output.0].drivers.push(id);
        let inputs: Vec<NetId> = inputs
            .iter()
            .map(|name| {
                let net = self.ensure_net(name);
                self.nets[net.0].loads.push(id);
                net
            })
            .collect();
        self.gates.push(Gate {
            name: instance.to_string(),
            kind: parsed,
            inputs,
            output,
        });
        Ok(id)
    }

    /// Adds a flip-flop instance with the given port bindings.
    ///
    /// The net bound to `q` is marked as flip-flop driven. A kind outside
    /// the closed set is accepted with a warning and stays inert.
    pub fn add_flip_flop(
        &mut self,
        kind: &str,
        instance: &str,
        ports: PortBindings,
    ) -> Result<FlipFlopId, BuildError> {
        if !self.ff_names.insert(instance.to_string()) {
            return Err(BuildError::DuplicateInstance(instance.to_string()));
        }
        let parsed = FlipFlopKind::parse(kind);
        if parsed.is_none() {
            warn!(
                "flip-flop `{}` has unknown kind `{}` and will not propagate measures",
                instance, kind
            );
        }

        let bind = |b: &Option<String>, builder: &mut Self| -> Option<NetId> {
            b.as_deref().map(|name| builder.ensure_net(name))
        };
        let clk = bind(&ports.clk, self);
        let d = bind(&ports.d, self);
        let q = bind(&ports.q, self);
        let t = bind(&ports.t, self);
        let j = bind(&ports.j, self);
        let k = bind(&ports.k, self);
        let s = bind(&ports.s, self);
        let r = bind(&ports.r, self);
        if let Some(q) = q {
            self.nets[q.0].driven_by_flip_flop = true;
        }

        let id = FlipFlopId(self.flipflops.len());
        self.flipflops.push(FlipFlop {
            name: instance.to_string(),
            kind: parsed,
            clk,
            d,
            q,
            t,
            j,
            k,
            s,
            r,
        });
        Ok(id)
    }

    /// Freezes the builder into an immutable [`Circuit`].
    pub fn finish(self) -> Circuit {
        Circuit {
            name: self.name,
            nets: self.nets,
            gates: self.gates,
            flipflops: self.flipflops,
            net_index: self.net_index,
            inputs: self.inputs,
            outputs: self.outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_wires_get_created() {
        let mut builder = CircuitBuilder::new("top");
        builder.declare_input("a");
        builder.add_gate("not", "g1", "y", &["a"]).unwrap();
        let circuit = builder.finish();
        let y = circuit.find_net("y").unwrap();
        assert_eq!(circuit.net(y).role(), NetRole::Wire);
        assert_eq!(circuit.net(y).drivers().len(), 1);
    }

    #[test]
    fn duplicate_gate_name_rejected() {
        let mut builder = CircuitBuilder::new("top");
        builder.add_gate("and", "g1", "x", &["a", "b"]).unwrap();
        let err = builder.add_gate("or", "g1", "y", &["a", "b"]).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateInstance(name) if name == "g1"));
    }

    #[test]
    fn flip_flop_and_gate_namespaces_are_separate() {
        let mut builder = CircuitBuilder::new("top");
        builder.add_gate("and", "u1", "x", &["a", "b"]).unwrap();
        assert!(
            builder
                .add_flip_flop("dff", "u1", PortBindings::dff("clk", "x", "q"))
                .is_ok()
        );
        let err = builder
            .add_flip_flop("dff", "u1", PortBindings::dff("clk", "x", "q2"))
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateInstance(_)));
    }

    #[test]
    fn xor_arity_is_exactly_two() {
        let mut builder = CircuitBuilder::new("top");
        let err = builder
            .add_gate("xor", "g1", "y", &["a", "b", "c"])
            .unwrap_err();
        match err {
            BuildError::Arity { kind, got, .. } => {
                assert_eq!(kind, GateKind::Xor);
                assert_eq!(got, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejected_instance_name_can_be_reused() {
        let mut builder = CircuitBuilder::new("top");
        assert!(builder.add_gate("not", "g1", "y", &["a", "b"]).is_err());
        assert!(builder.add_gate("not", "g1", "y", &["a"]).is_ok());
    }

    #[test]
    fn q_net_is_flip_flop_driven() {
        let mut builder = CircuitBuilder::new("top");
        builder.declare_input("clk");
        builder
            .add_flip_flop("dff", "ff1", PortBindings::dff("clk", "d", "q"))
            .unwrap();
        let circuit = builder.finish();
        let q = circuit.find_net("q").unwrap();
        assert!(circuit.net(q).driven_by_flip_flop());
        assert!(!circuit.net(circuit.find_net("d").unwrap()).driven_by_flip_flop());
    }
}
