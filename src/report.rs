/*!

  Read-only views over nets and their measures, consumed by external
  emitters. Infinity surfaces as `-1` wherever a plain integer is expected.

*/

use crate::circuit::{NetId, NetRole};
use crate::cost::Cost;
use crate::netlist::Circuit;

/// A read-only view of one net and its six SCOAP measures.
#[derive(Clone, Copy)]
pub struct NetView<'a> {
    circuit: &'a Circuit,
    id: NetId,
}

impl<'a> NetView<'a> {
    /// The net's id within the circuit.
    pub fn id(&self) -> NetId {
        self.id
    }

    /// The net's name.
    pub fn name(&self) -> &'a str {
        self.circuit.net(self.id).name()
    }

    /// The net's role at the module boundary.
    pub fn role(&self) -> NetRole {
        self.circuit.net(self.id).role()
    }

    /// Returns `true` if the net is a flip-flop's state output.
    pub fn driven_by_flip_flop(&self) -> bool {
        self.circuit.net(self.id).driven_by_flip_flop()
    }

    /// The topological level, if the leveler assigned one.
    pub fn level(&self) -> Option<u32> {
        self.circuit.net(self.id).level()
    }

    /// Names of the gates driving this net.
    pub fn drivers(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.circuit
            .net(self.id)
            .drivers()
            .iter()
            .map(|&g| self.circuit.gate(g).name())
    }

    /// Names of the gates this net feeds.
    pub fn loads(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.circuit
            .net(self.id)
            .loads()
            .iter()
            .map(|&g| self.circuit.gate(g).name())
    }

    /// Combinational 0-controllability.
    pub fn cc0(&self) -> Cost {
        self.circuit.net(self.id).cc0()
    }

    /// Combinational 1-controllability.
    pub fn cc1(&self) -> Cost {
        self.circuit.net(self.id).cc1()
    }

    /// Sequential 0-controllability.
    pub fn sc0(&self) -> Cost {
        self.circuit.net(self.id).sc0()
    }

    /// Sequential 1-controllability.
    pub fn sc1(&self) -> Cost {
        self.circuit.net(self.id).sc1()
    }

    /// Combinational observability.
    pub fn co(&self) -> Cost {
        self.circuit.net(self.id).co()
    }

    /// Sequential observability.
    pub fn so(&self) -> Cost {
        self.circuit.net(self.id).so()
    }

    /// Flattens the view into an owned record with the `-1` sentinel
    /// convention applied.
    pub fn record(&self) -> NetRecord {
        NetRecord {
            name: self.name().to_string(),
            role: self.role().as_str(),
            driven_by_flip_flop: self.driven_by_flip_flop(),
            level: self.level().map_or(-1, i64::from),
            drivers: self.drivers().map(str::to_string).collect(),
            loads: self.loads().map(str::to_string).collect(),
            cc0: self.cc0().report_value(),
            cc1: self.cc1().report_value(),
            sc0: self.sc0().report_value(),
            sc1: self.sc1().report_value(),
            co: self.co().report_value(),
            so: self.so().report_value(),
        }
    }
}

/// An owned, emitter-friendly rendition of one net's report row.
///
/// Unassigned levels and infinite measures are both rendered as `-1`.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetRecord {
    /// Net name.
    pub name: String,
    /// Net role (`input`, `output`, or `wire`).
    pub role: &'static str,
    /// Whether the net is a flip-flop's state output.
    pub driven_by_flip_flop: bool,
    /// Topological level, `-1` if undefined.
    pub level: i64,
    /// Names of driving gates.
    pub drivers: Vec<String>,
    /// Names of loading gates.
    pub loads: Vec<String>,
    /// Combinational 0-controllability, `-1` for infinity.
    pub cc0: i64,
    /// Combinational 1-controllability, `-1` for infinity.
    pub cc1: i64,
    /// Sequential 0-controllability, `-1` for infinity.
    pub sc0: i64,
    /// Sequential 1-controllability, `-1` for infinity.
    pub sc1: i64,
    /// Combinational observability, `-1` for infinity.
    pub co: i64,
    /// Sequential observability, `-1` for infinity.
    pub so: i64,
}

/// Enumerates all nets of the circuit in declaration order.
pub fn nets(circuit: &Circuit) -> impl Iterator<Item = NetView<'_>> {
    circuit.nets().map(|(id, _)| NetView { circuit, id })
}

/// Looks up a single net's view by name.
pub fn net_by_name<'a>(circuit: &'a Circuit, name: &str) -> Option<NetView<'a>> {
    circuit.find_net(name).map(|id| NetView { circuit, id })
}

/// Writes every net's record as a JSON array.
#[cfg(feature = "serde")]
pub fn write_json<W: std::io::Write>(circuit: &Circuit, writer: W) -> serde_json::Result<()> {
    let records: Vec<NetRecord> = nets(circuit).map(|view| view.record()).collect();
    serde_json::to_writer_pretty(writer, &records)
}
