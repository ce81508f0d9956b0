/*!

  Types for the constructs found within a gate-level circuit.

*/

use crate::cost::Cost;

/// Index of a [`Net`] within a [`Circuit`](crate::netlist::Circuit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetId(pub(crate) usize);

impl NetId {
    /// Returns the raw arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Index of a [`Gate`] within a [`Circuit`](crate::netlist::Circuit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GateId(pub(crate) usize);

impl GateId {
    /// Returns the raw arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Index of a [`FlipFlop`] within a [`Circuit`](crate::netlist::Circuit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlipFlopId(pub(crate) usize);

impl FlipFlopId {
    /// Returns the raw arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The role a net plays at the module boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetRole {
    /// A top-level input port.
    PrimaryInput,
    /// A top-level output port.
    PrimaryOutput,
    /// An internal wire.
    Wire,
}

impl NetRole {
    /// Returns a short textual name for the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            NetRole::PrimaryInput => "input",
            NetRole::PrimaryOutput => "output",
            NetRole::Wire => "wire",
        }
    }
}

impl std::fmt::Display for NetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The closed set of combinational gate kinds the engines understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Logical AND.
    And,
    /// Logical NAND.
    Nand,
    /// Logical OR.
    Or,
    /// Logical NOR.
    Nor,
    /// Two-input exclusive OR.
    Xor,
    /// Two-input exclusive NOR.
    Xnor,
    /// Inverter.
    Not,
    /// Non-inverting buffer.
    Buf,
}

impl GateKind {
    /// Parses a gate kind from its netlist keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "and" => Some(GateKind::And),
            "nand" => Some(GateKind::Nand),
            "or" => Some(GateKind::Or),
            "nor" => Some(GateKind::Nor),
            "xor" => Some(GateKind::Xor),
            "xnor" => Some(GateKind::Xnor),
            "not" => Some(GateKind::Not),
            "buf" => Some(GateKind::Buf),
            _ => None,
        }
    }

    /// Returns the netlist keyword for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            GateKind::And => "and",
            GateKind::Nand => "nand",
            GateKind::Or => "or",
            GateKind::Nor => "nor",
            GateKind::Xor => "xor",
            GateKind::Xnor => "xnor",
            GateKind::Not => "not",
            GateKind::Buf => "buf",
        }
    }

    /// Input-count bounds for this kind as `(min, max)`, with [`None`] for
    /// an unbounded fan-in.
    pub const fn input_arity(self) -> (usize, Option<usize>) {
        match self {
            GateKind::Not | GateKind::Buf => (1, Some(1)),
            GateKind::Xor | GateKind::Xnor => (2, Some(2)),
            _ => (1, None),
        }
    }

    /// Returns `true` if a gate of this kind may take `n` inputs.
    pub const fn accepts_inputs(self, n: usize) -> bool {
        let (min, max) = self.input_arity();
        match max {
            Some(max) => n >= min && n <= max,
            None => n >= min,
        }
    }
}

impl std::fmt::Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The flip-flop kinds the data model carries.
///
/// Only [`FlipFlopKind::Dff`] propagates sequential measures; the remaining
/// kinds are reserved and inert in the engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlipFlopKind {
    /// D-type flip-flop with ports `clk`, `d`, `q`.
    Dff,
    /// Toggle flip-flop (reserved).
    Tff,
    /// JK flip-flop (reserved).
    Jkff,
    /// Set/reset flip-flop (reserved).
    Srff,
}

impl FlipFlopKind {
    /// Parses a flip-flop kind from its netlist keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dff" => Some(FlipFlopKind::Dff),
            "tff" => Some(FlipFlopKind::Tff),
            "jkff" => Some(FlipFlopKind::Jkff),
            "srff" => Some(FlipFlopKind::Srff),
            _ => None,
        }
    }

    /// Returns the netlist keyword for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            FlipFlopKind::Dff => "dff",
            FlipFlopKind::Tff => "tff",
            FlipFlopKind::Jkff => "jkff",
            FlipFlopKind::Srff => "srff",
        }
    }
}

impl std::fmt::Display for FlipFlopKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Port-to-net bindings for a flip-flop instance, named by role.
///
/// Unused ports stay [`None`]; a `dff` only binds `clk`, `d`, and `q`.
#[derive(Debug, Clone, Default)]
pub struct PortBindings {
    /// Clock input.
    pub clk: Option<String>,
    /// Data input (`dff`).
    pub d: Option<String>,
    /// State output.
    pub q: Option<String>,
    /// Toggle input (`tff`).
    pub t: Option<String>,
    /// J input (`jkff`).
    pub j: Option<String>,
    /// K input (`jkff`).
    pub k: Option<String>,
    /// Set input (`srff`).
    pub s: Option<String>,
    /// Reset input (`srff`).
    pub r: Option<String>,
}

impl PortBindings {
    /// Bindings for a D flip-flop.
    pub fn dff(clk: &str, d: &str, q: &str) -> Self {
        Self {
            clk: Some(clk.to_string()),
            d: Some(d.to_string()),
            q: Some(q.to_string()),
            ..Self::default()
        }
    }
}

/// A signal net, keyed by name, carrying its connectivity and the six
/// SCOAP measures.
#[derive(Debug, Clone)]
pub struct Net {
    pub(crate) name: String,
    pub(crate) role: NetRole,
    pub(crate) driven_by_flip_flop: bool,
    pub(crate) drivers: Vec<GateId>,
    pub(crate) loads: Vec<GateId>,
    pub(crate) level: Option<u32>,
    pub(crate) cc0: Cost,
    pub(crate) cc1: Cost,
    pub(crate) sc0: Cost,
    pub(crate) sc1: Cost,
    pub(crate) co: Cost,
    pub(crate) so: Cost,
}

impl Net {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            role: NetRole::Wire,
            driven_by_flip_flop: false,
            drivers: Vec::new(),
            loads: Vec::new(),
            level: None,
            cc0: Cost::INFINITY,
            cc1: Cost::INFINITY,
            sc0: Cost::INFINITY,
            sc1: Cost::INFINITY,
            co: Cost::INFINITY,
            so: Cost::INFINITY,
        }
    }

    /// Returns the name of the net.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the role of the net at the module boundary.
    pub fn role(&self) -> NetRole {
        self.role
    }

    /// Returns `true` if the net is a flip-flop's state output.
    pub fn driven_by_flip_flop(&self) -> bool {
        self.driven_by_flip_flop
    }

    /// Gates driving this net, in insertion order.
    pub fn drivers(&self) -> &[GateId] {
        &self.drivers
    }

    /// Gates this net feeds, one entry per input position, in insertion order.
    pub fn loads(&self) -> &[GateId] {
        &self.loads
    }

    /// The topological level, or [`None`] if the net is unreachable from the
    /// primary inputs and flip-flop outputs.
    pub fn level(&self) -> Option<u32> {
        self.level
    }

    /// Combinational 0-controllability.
    pub fn cc0(&self) -> Cost {
        self.cc0
    }

    /// Combinational 1-controllability.
    pub fn cc1(&self) -> Cost {
        self.cc1
    }

    /// Sequential 0-controllability.
    pub fn sc0(&self) -> Cost {
        self.sc0
    }

    /// Sequential 1-controllability.
    pub fn sc1(&self) -> Cost {
        self.sc1
    }

    /// Combinational observability.
    pub fn co(&self) -> Cost {
        self.co
    }

    /// Sequential observability.
    pub fn so(&self) -> Cost {
        self.so
    }
}

impl std::fmt::Display for Net {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A combinational gate instance.
#[derive(Debug, Clone)]
pub struct Gate {
    pub(crate) name: String,
    pub(crate) kind: Option<GateKind>,
    pub(crate) inputs: Vec<NetId>,
    pub(crate) output: NetId,
}

impl Gate {
    /// Returns the instance name of the gate.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The gate kind, or [`None`] if the declared type was outside the
    /// closed set and the gate is skipped by the engines.
    pub fn kind(&self) -> Option<GateKind> {
        self.kind
    }

    /// Input nets in port order.
    pub fn inputs(&self) -> &[NetId] {
        &self.inputs
    }

    /// The single output net.
    pub fn output(&self) -> NetId {
        self.output
    }
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{}({})", kind, self.name),
            None => write!(f, "unknown({})", self.name),
        }
    }
}

/// A sequential element instance with resolved port bindings.
#[derive(Debug, Clone)]
pub struct FlipFlop {
    pub(crate) name: String,
    pub(crate) kind: Option<FlipFlopKind>,
    pub(crate) clk: Option<NetId>,
    pub(crate) d: Option<NetId>,
    pub(crate) q: Option<NetId>,
    pub(crate) t: Option<NetId>,
    pub(crate) j: Option<NetId>,
    pub(crate) k: Option<NetId>,
    pub(crate) s: Option<NetId>,
    pub(crate) r: Option<NetId>,
}

impl FlipFlop {
    /// Returns the instance name of the flip-flop.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flip-flop kind, or [`None`] if the declared type was outside the
    /// closed set.
    pub fn kind(&self) -> Option<FlipFlopKind> {
        self.kind
    }

    /// The clock net, if bound.
    pub fn clk(&self) -> Option<NetId> {
        self.clk
    }

    /// The data net, if bound.
    pub fn d(&self) -> Option<NetId> {
        self.d
    }

    /// The state output net, if bound.
    pub fn q(&self) -> Option<NetId> {
        self.q
    }

    /// The toggle net, if bound.
    pub fn t(&self) -> Option<NetId> {
        self.t
    }

    /// The J net, if bound.
    pub fn j(&self) -> Option<NetId> {
        self.j
    }

    /// The K net, if bound.
    pub fn k(&self) -> Option<NetId> {
        self.k
    }

    /// The set net, if bound.
    pub fn s(&self) -> Option<NetId> {
        self.s
    }

    /// The reset net, if bound.
    pub fn r(&self) -> Option<NetId> {
        self.r
    }
}

impl std::fmt::Display for FlipFlop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{}({})", kind, self.name),
            None => write!(f, "unknown({})", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_kind_keywords_round_trip() {
        for kind in [
            GateKind::And,
            GateKind::Nand,
            GateKind::Or,
            GateKind::Nor,
            GateKind::Xor,
            GateKind::Xnor,
            GateKind::Not,
            GateKind::Buf,
        ] {
            assert_eq!(GateKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(GateKind::parse("mux"), None);
    }

    #[test]
    fn arity_bounds() {
        assert!(GateKind::And.accepts_inputs(1));
        assert!(GateKind::And.accepts_inputs(5));
        assert!(!GateKind::And.accepts_inputs(0));
        assert!(GateKind::Xor.accepts_inputs(2));
        assert!(!GateKind::Xor.accepts_inputs(3));
        assert!(GateKind::Not.accepts_inputs(1));
        assert!(!GateKind::Buf.accepts_inputs(2));
    }

    #[test]
    fn dff_bindings() {
        let ports = PortBindings::dff("clk", "din", "qout");
        assert_eq!(ports.clk.as_deref(), Some("clk"));
        assert_eq!(ports.d.as_deref(), Some("din"));
        assert_eq!(ports.q.as_deref(), Some("qout"));
        assert!(ports.t.is_none() && ports.j.is_none());
    }
}
