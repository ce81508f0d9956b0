use scoap_net::circuit::{GateKind, NetRole, PortBindings};
use scoap_net::netlist::{BuildError, CircuitBuilder};

#[test]
fn declarations_assign_roles() {
    let mut builder = CircuitBuilder::new("roles");
    builder.declare_input("a");
    builder.declare_output("y");
    builder.declare_wire("w");
    let circuit = builder.finish();

    assert_eq!(circuit.name(), "roles");
    assert_eq!(circuit.net_count(), 3);
    let role_of = |name: &str| circuit.net(circuit.find_net(name).unwrap()).role();
    assert_eq!(role_of("a"), NetRole::PrimaryInput);
    assert_eq!(role_of("y"), NetRole::PrimaryOutput);
    assert_eq!(role_of("w"), NetRole::Wire);
}

#[test]
fn redeclaration_moves_a_net_between_port_lists() {
    let mut builder = CircuitBuilder::new("redeclare");
    let id = builder.declare_input("x");
    assert_eq!(builder.declare_output("x"), id);
    let circuit = builder.finish();

    // The net holds exactly one role; the port lists agree.
    assert_eq!(circuit.net(id).role(), NetRole::PrimaryOutput);
    assert!(circuit.primary_inputs().is_empty());
    assert_eq!(circuit.primary_outputs(), &[id]);
}

#[test]
fn referenced_nets_are_created_as_wires() {
    let mut builder = CircuitBuilder::new("implicit");
    builder
        .add_gate("nand", "g1", "y", &["a", "b"])
        .unwrap();
    let circuit = builder.finish();

    assert_eq!(circuit.net_count(), 3);
    for name in ["a", "b", "y"] {
        let id = circuit.find_net(name).unwrap();
        assert_eq!(circuit.net(id).role(), NetRole::Wire);
    }
}

#[test]
fn connectivity_is_recorded_per_port() {
    let mut builder = CircuitBuilder::new("wiring");
    builder.declare_input("a");
    let g1 = builder.add_gate("and", "g1", "x", &["a", "a"]).unwrap();
    let g2 = builder.add_gate("not", "g2", "y", &["x"]).unwrap();
    let circuit = builder.finish();

    let a = circuit.find_net("a").unwrap();
    let x = circuit.find_net("x").unwrap();
    // One load entry per input position, duplicates tolerated.
    assert_eq!(circuit.net(a).loads(), &[g1, g1]);
    assert_eq!(circuit.net(x).drivers(), &[g1]);
    assert_eq!(circuit.net(x).loads(), &[g2]);
    assert_eq!(circuit.gate(g2).inputs(), &[x]);
    assert_eq!(circuit.gate(g1).kind(), Some(GateKind::And));
}

#[test]
fn duplicate_instances_are_fatal() {
    let mut builder = CircuitBuilder::new("dups");
    builder.add_gate("and", "g1", "x", &["a", "b"]).unwrap();
    let err = builder.add_gate("and", "g1", "y", &["a", "b"]).unwrap_err();
    assert_eq!(err.to_string(), "duplicate instance name `g1`");

    builder
        .add_flip_flop("dff", "ff1", PortBindings::dff("clk", "x", "q"))
        .unwrap();
    let err = builder
        .add_flip_flop("dff", "ff1", PortBindings::dff("clk", "x", "q2"))
        .unwrap_err();
    assert!(matches!(err, BuildError::DuplicateInstance(_)));
}

#[test]
fn arity_violations_are_fatal() {
    let mut builder = CircuitBuilder::new("arity");
    for (kind, inputs) in [
        ("not", vec!["a", "b"]),
        ("buf", vec![]),
        ("xor", vec!["a"]),
        ("xnor", vec!["a", "b", "c"]),
        ("and", vec![]),
    ] {
        let err = builder
            .add_gate(kind, "g1", "y", &inputs)
            .unwrap_err();
        assert!(matches!(err, BuildError::Arity { .. }), "{kind} accepted");
    }
    // The failed instances left no trace.
    let circuit = builder.finish();
    assert_eq!(circuit.gate_count(), 0);
}

#[test]
fn arity_errors_name_the_offender() {
    let mut builder = CircuitBuilder::new("arity_msg");
    let err = builder.add_gate("xor", "gx", "y", &["a"]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("gx"));
    assert!(msg.contains("exactly 2"));
    assert!(msg.contains("got 1"));
}

#[test]
fn unknown_kinds_are_accepted_inert() {
    let mut builder = CircuitBuilder::new("unknown");
    let gate = builder
        .add_gate("majority", "u1", "y", &["a", "b", "c"])
        .unwrap();
    let ff = builder
        .add_flip_flop("latch", "u2", PortBindings::dff("clk", "y", "q"))
        .unwrap();
    let circuit = builder.finish();

    assert_eq!(circuit.gate(gate).kind(), None);
    assert_eq!(circuit.flip_flop(ff).kind(), None);
    // The q binding still marks its net as sequential.
    let q = circuit.find_net("q").unwrap();
    assert!(circuit.net(q).driven_by_flip_flop());
}

#[test]
fn flip_flop_ports_resolve_to_nets() {
    let mut builder = CircuitBuilder::new("ffports");
    builder.declare_input("clk");
    let ff = builder
        .add_flip_flop("dff", "ff1", PortBindings::dff("clk", "d", "q"))
        .unwrap();
    let circuit = builder.finish();

    let ff = circuit.flip_flop(ff);
    assert_eq!(ff.clk(), circuit.find_net("clk"));
    assert_eq!(ff.d(), circuit.find_net("d"));
    assert_eq!(ff.q(), circuit.find_net("q"));
    assert_eq!(ff.t(), None);
}

#[test]
fn port_lists_preserve_declaration_order() {
    let mut builder = CircuitBuilder::new("order");
    builder.declare_input("b");
    builder.declare_input("a");
    builder.declare_output("z");
    builder.declare_output("y");
    let circuit = builder.finish();

    let names: Vec<&str> = circuit
        .primary_inputs()
        .iter()
        .map(|&id| circuit.net(id).name())
        .collect();
    assert_eq!(names, vec!["b", "a"]);
    let names: Vec<&str> = circuit
        .primary_outputs()
        .iter()
        .map(|&id| circuit.net(id).name())
        .collect();
    assert_eq!(names, vec!["z", "y"]);
}
