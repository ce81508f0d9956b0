#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, unreachable_pub)]
/*!

`scoap-net`

SCOAP testability analysis for gate-level netlists. Given a circuit of
combinational gates and D flip-flops, the engines compute six integer
measures per net: combinational controllability to 0 and 1 (CC0/CC1),
sequential controllability (SC0/SC1), and combinational and sequential
observability (CO/SO). Controllability flows forward in topological level
order, observability backward, and the sequential measures iterate to a
fixpoint across flip-flop feedback.

*/
#![doc = "## Simple Example\n```"]
#![doc = "use scoap_net::netlist::CircuitBuilder;
use scoap_net::report;

let mut builder = CircuitBuilder::new(\"s1\");
builder.declare_input(\"p\");
builder.declare_input(\"q\");
builder.declare_output(\"y\");
builder.add_gate(\"and\", \"g1\", \"y\", &[\"p\", \"q\"]).unwrap();

let mut circuit = builder.finish();
circuit.run_all();

let y = report::net_by_name(&circuit, \"y\").unwrap();
assert_eq!(y.cc0().value(), Some(2));
assert_eq!(y.cc1().value(), Some(3));"]
#![doc = "\n```"]

pub mod circuit;
pub mod cost;
pub mod graph;
pub mod netlist;
pub mod report;
pub mod scoap;
