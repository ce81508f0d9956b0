/*!

  The SCOAP propagation engines: levelization, controllability, and
  observability sweeps over a frozen [`Circuit`].

*/

use crate::circuit::{FlipFlopKind, GateId, GateKind, NetId, NetRole};
use crate::cost::Cost;
use crate::netlist::Circuit;
use log::{debug, warn};
use std::collections::VecDeque;

/// Applies the per-kind controllability rules to one gate.
///
/// `zeros`/`ones` are the 0- and 1-controllabilities of the inputs in port
/// order; `step` is the cost of crossing the gate ([`Cost::ONE`] gate level
/// for the combinational measures, [`Cost::ZERO`] for the sequential ones,
/// which count clock events instead).
fn controllability_of(kind: GateKind, zeros: &[Cost], ones: &[Cost], step: Cost) -> (Cost, Cost) {
    let min0 = zeros.iter().copied().min().unwrap_or(Cost::INFINITY);
    let min1 = ones.iter().copied().min().unwrap_or(Cost::INFINITY);
    let sum0: Cost = zeros.iter().copied().sum();
    let sum1: Cost = ones.iter().copied().sum();
    let (c0, c1) = match kind {
        GateKind::And => (min0, sum1),
        GateKind::Nand => (sum1, min0),
        GateKind::Or => (sum0, min1),
        GateKind::Nor => (min1, sum0),
        GateKind::Xor => (
            (zeros[0] + zeros[1]).min(ones[0] + ones[1]),
            (zeros[0] + ones[1]).min(ones[0] + zeros[1]),
        ),
        GateKind::Xnor => (
            (zeros[0] + ones[1]).min(ones[0] + zeros[1]),
            (zeros[0] + zeros[1]).min(ones[0] + ones[1]),
        ),
        GateKind::Not => (ones[0], zeros[0]),
        GateKind::Buf => (zeros[0], ones[0]),
    };
    (step + c0, step + c1)
}

impl Circuit {
    /// Assigns a topological level to every net reachable from the primary
    /// inputs and flip-flop outputs.
    ///
    /// Breadth-first from the level-0 seeds, draining a remaining-input
    /// counter per gate; a gate's output gets `1 + max(level of inputs)` once
    /// every input has been leveled. Gates inside combinational loops never
    /// drain their counter, so their outputs keep an undefined level, as do
    /// nets unreachable from any seed.
    pub fn compute_levels(&mut self) {
        let mut remaining: Vec<usize> = self.gates.iter().map(|g| g.inputs().len()).collect();
        let mut queue: VecDeque<NetId> = VecDeque::new();
        for (i, net) in self.nets.iter_mut().enumerate() {
            net.level = None;
            if net.role == NetRole::PrimaryInput || net.driven_by_flip_flop {
                net.level = Some(0);
                queue.push_back(NetId(i));
            }
        }

        while let Some(net) = queue.pop_front() {
            let loads = self.nets[net.index()].loads.clone();
            for gate in loads {
                let g = gate.index();
                if remaining[g] == 0 {
                    continue;
                }
                remaining[g] -= 1;
                if remaining[g] > 0 {
                    continue;
                }
                let max_in = self.gates[g]
                    .inputs()
                    .iter()
                    .filter_map(|&i| self.nets[i.index()].level)
                    .max()
                    .unwrap_or(0);
                let output = self.gates[g].output();
                self.nets[output.index()].level = Some(max_in + 1);
                queue.push_back(output);
            }
        }

        let leveled = self.nets.iter().filter(|n| n.level.is_some()).count();
        debug!("leveled {} of {} nets", leveled, self.nets.len());
    }

    /// The gates whose output nets carry a defined level, sorted ascending
    /// by that level. Gates left unlevelized (loops, unreachable regions)
    /// are excluded and therefore skipped by every sweep.
    pub(crate) fn level_schedule(&self) -> Vec<GateId> {
        let mut schedule: Vec<GateId> = self
            .gates
            .iter()
            .enumerate()
            .filter(|(_, g)| self.nets[g.output().index()].level.is_some())
            .map(|(i, _)| GateId(i))
            .collect();
        schedule.sort_by_key(|&g| self.nets[self.gates[g.index()].output().index()].level);
        schedule
    }

    /// Sweep-count bound for the sequential fixpoints. Values strictly
    /// decrease and are bounded below by zero, so the fixpoint is reached
    /// well within `flip-flops x depth` sweeps; exceeding the bound
    /// indicates a bug.
    fn fixpoint_cap(&self) -> usize {
        let depth = self.nets.iter().filter_map(|n| n.level).max().unwrap_or(0) as usize;
        self.flipflops.len().max(1) * (depth + 1) + 1
    }

    /// Computes CC0/CC1 in one forward pass and SC0/SC1 by fixpoint
    /// iteration. Requires [`Circuit::compute_levels`] to have run.
    pub fn compute_controllability(&mut self) {
        let schedule = self.level_schedule();
        self.controllability_passes(&schedule);
    }

    pub(crate) fn controllability_passes(&mut self, schedule: &[GateId]) {
        // Combinational: primary inputs and flip-flop outputs cost one
        // assignment; everything else starts unreachable.
        for net in &mut self.nets {
            if net.role == NetRole::PrimaryInput || net.driven_by_flip_flop {
                net.cc0 = Cost::ONE;
                net.cc1 = Cost::ONE;
            } else {
                net.cc0 = Cost::INFINITY;
                net.cc1 = Cost::INFINITY;
            }
        }
        for &gate in schedule {
            let Some(kind) = self.gates[gate.index()].kind() else {
                continue;
            };
            let (zeros, ones): (Vec<Cost>, Vec<Cost>) = self.gates[gate.index()]
                .inputs()
                .iter()
                .map(|&i| {
                    let net = &self.nets[i.index()];
                    (net.cc0, net.cc1)
                })
                .unzip();
            let (c0, c1) = controllability_of(kind, &zeros, &ones, Cost::ONE);
            let output = self.gates[gate.index()].output();
            self.nets[output.index()].cc0 = c0;
            self.nets[output.index()].cc1 = c1;
        }

        // Sequential: only primary inputs are free; everything else has to
        // earn a finite value through the fixpoint.
        for net in &mut self.nets {
            if net.role == NetRole::PrimaryInput {
                net.sc0 = Cost::ZERO;
                net.sc1 = Cost::ZERO;
            } else {
                net.sc0 = Cost::INFINITY;
                net.sc1 = Cost::INFINITY;
            }
        }
        self.warn_inert_flip_flops("controllability");

        let cap = self.fixpoint_cap();
        let mut sweeps = 0usize;
        loop {
            let mut changed = false;
            for &gate in schedule {
                let Some(kind) = self.gates[gate.index()].kind() else {
                    continue;
                };
                let (zeros, ones): (Vec<Cost>, Vec<Cost>) = self.gates[gate.index()]
                    .inputs()
                    .iter()
                    .map(|&i| {
                        let net = &self.nets[i.index()];
                        (net.sc0, net.sc1)
                    })
                    .unzip();
                let (c0, c1) = controllability_of(kind, &zeros, &ones, Cost::ZERO);
                let output = self.gates[gate.index()].output();
                let net = &mut self.nets[output.index()];
                if c0 < net.sc0 {
                    net.sc0 = c0;
                    changed = true;
                }
                if c1 < net.sc1 {
                    net.sc1 = c1;
                    changed = true;
                }
            }
            for f in 0..self.flipflops.len() {
                let ff = &self.flipflops[f];
                if ff.kind() != Some(FlipFlopKind::Dff) {
                    continue;
                }
                let (Some(clk), Some(d), Some(q)) = (ff.clk(), ff.d(), ff.q()) else {
                    continue;
                };
                // One clock event plus the cost of producing both clock
                // levels to realize an edge.
                let edge = self.nets[clk.index()].sc0 + self.nets[clk.index()].sc1 + Cost::ONE;
                let q0 = self.nets[d.index()].sc0 + edge;
                let q1 = self.nets[d.index()].sc1 + edge;
                let net = &mut self.nets[q.index()];
                if q0 < net.sc0 {
                    net.sc0 = q0;
                    changed = true;
                }
                if q1 < net.sc1 {
                    net.sc1 = q1;
                    changed = true;
                }
            }
            sweeps += 1;
            if !changed {
                break;
            }
            if sweeps >= cap {
                warn!(
                    "sequential controllability did not settle after {} sweeps",
                    sweeps
                );
                break;
            }
        }
        debug!("sequential controllability settled after {} sweeps", sweeps);
    }

    /// Computes CO in one reverse pass and SO by fixpoint iteration.
    /// Requires levels and controllability to have been computed.
    pub fn compute_observability(&mut self) {
        let schedule = self.level_schedule();
        self.observability_passes(&schedule);
    }

    pub(crate) fn observability_passes(&mut self, schedule: &[GateId]) {
        for net in &mut self.nets {
            let seed = if net.role == NetRole::PrimaryOutput {
                Cost::ZERO
            } else {
                Cost::INFINITY
            };
            net.co = seed;
            net.so = seed;
        }

        // Combinational: one pass in descending level order. A net loaded
        // by several gates keeps the cheapest propagation path.
        for &gate in schedule.iter().rev() {
            let Some(kind) = self.gates[gate.index()].kind() else {
                continue;
            };
            let co_y = self.nets[self.gates[gate.index()].output().index()].co;
            if co_y.is_infinite() {
                continue;
            }
            for i in 0..self.gates[gate.index()].inputs().len() {
                let contribution = match kind {
                    GateKind::And | GateKind::Nand => {
                        co_y + Cost::ONE + self.side_input_sum(gate, i, |n| n.cc1)
                    }
                    GateKind::Or | GateKind::Nor => {
                        co_y + Cost::ONE + self.side_input_sum(gate, i, |n| n.cc0)
                    }
                    GateKind::Not | GateKind::Buf => co_y + Cost::ONE,
                    GateKind::Xor | GateKind::Xnor => {
                        let other = self.gates[gate.index()].inputs()[1 - i];
                        let other = &self.nets[other.index()];
                        co_y + Cost::ONE + other.cc0.min(other.cc1)
                    }
                };
                let input = self.gates[gate.index()].inputs()[i];
                let net = &mut self.nets[input.index()];
                if contribution < net.co {
                    net.co = contribution;
                }
            }
        }

        self.warn_inert_flip_flops("observability");

        let cap = self.fixpoint_cap();
        let mut sweeps = 0usize;
        loop {
            let mut changed = false;
            // Observing a dff's data input means observing q one clock
            // event later.
            for f in 0..self.flipflops.len() {
                let ff = &self.flipflops[f];
                if ff.kind() != Some(FlipFlopKind::Dff) {
                    continue;
                }
                let (Some(clk), Some(d), Some(q)) = (ff.clk(), ff.d(), ff.q()) else {
                    continue;
                };
                let so_q = self.nets[q.index()].so;
                if so_q.is_infinite() {
                    continue;
                }
                let edge = self.nets[clk.index()].sc0 + self.nets[clk.index()].sc1 + Cost::ONE;
                let candidate = so_q + edge;
                let net = &mut self.nets[d.index()];
                if candidate < net.so {
                    net.so = candidate;
                    changed = true;
                }
            }
            for &gate in schedule.iter().rev() {
                let Some(kind) = self.gates[gate.index()].kind() else {
                    continue;
                };
                let so_y = self.nets[self.gates[gate.index()].output().index()].so;
                if so_y.is_infinite() {
                    continue;
                }
                for i in 0..self.gates[gate.index()].inputs().len() {
                    let candidate = match kind {
                        GateKind::And | GateKind::Nand => {
                            so_y + self.side_input_sum(gate, i, |n| n.sc1)
                        }
                        GateKind::Or | GateKind::Nor => {
                            so_y + self.side_input_sum(gate, i, |n| n.sc0)
                        }
                        GateKind::Not | GateKind::Buf => so_y,
                        // No sequential observability rule for the
                        // exclusive kinds.
                        GateKind::Xor | GateKind::Xnor => continue,
                    };
                    let input = self.gates[gate.index()].inputs()[i];
                    let net = &mut self.nets[input.index()];
                    if candidate < net.so {
                        net.so = candidate;
                        changed = true;
                    }
                }
            }
            sweeps += 1;
            if !changed {
                break;
            }
            if sweeps >= cap {
                warn!(
                    "sequential observability did not settle after {} sweeps",
                    sweeps
                );
                break;
            }
        }
        debug!("sequential observability settled after {} sweeps", sweeps);
    }

    /// Sums `measure` over every input of `gate` except position `skip`.
    fn side_input_sum(
        &self,
        gate: GateId,
        skip: usize,
        measure: impl Fn(&crate::circuit::Net) -> Cost,
    ) -> Cost {
        self.gates[gate.index()]
            .inputs()
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != skip)
            .map(|(_, &n)| measure(&self.nets[n.index()]))
            .sum()
    }

    fn warn_inert_flip_flops(&self, phase: &str) {
        for ff in &self.flipflops {
            match ff.kind() {
                Some(FlipFlopKind::Dff) | None => {}
                Some(kind) => warn!(
                    "flip-flop `{}` of kind `{}` does not propagate sequential {}",
                    ff.name(),
                    kind,
                    phase
                ),
            }
        }
    }

    /// The conventional pipeline: levels, then controllability, then
    /// observability, sharing one level-ordered gate schedule.
    pub fn run_all(&mut self) {
        self.compute_levels();
        let schedule = self.level_schedule();
        debug!(
            "scheduled {} of {} gates for propagation",
            schedule.len(),
            self.gates.len()
        );
        self.controllability_passes(&schedule);
        self.observability_passes(&schedule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_gate_rules() {
        let one = Cost::ONE;
        let (c0, c1) = controllability_of(GateKind::And, &[one, one], &[one, one], Cost::ONE);
        assert_eq!(c0, Cost::new(2));
        assert_eq!(c1, Cost::new(3));
    }

    #[test]
    fn inverting_a_kind_swaps_the_rules() {
        let zeros = [Cost::new(2), Cost::new(5)];
        let ones = [Cost::new(3), Cost::new(4)];
        for (kind, inverse) in [
            (GateKind::And, GateKind::Nand),
            (GateKind::Or, GateKind::Nor),
            (GateKind::Xor, GateKind::Xnor),
        ] {
            let (c0, c1) = controllability_of(kind, &zeros, &ones, Cost::ONE);
            let (i0, i1) = controllability_of(inverse, &zeros, &ones, Cost::ONE);
            assert_eq!((c0, c1), (i1, i0), "{kind} vs {inverse}");
        }
    }

    #[test]
    fn infinity_poisons_sums_but_not_mins() {
        let zeros = [Cost::ONE, Cost::INFINITY];
        let ones = [Cost::new(2), Cost::new(3)];
        let (c0, c1) = controllability_of(GateKind::Or, &zeros, &ones, Cost::ONE);
        // CC0 of an OR sums the zero-controllabilities; one is unreachable.
        assert!(c0.is_infinite());
        // CC1 takes the cheapest one-controllability, which stays finite.
        assert_eq!(c1, Cost::new(3));
    }

    #[test]
    fn sequential_step_omits_the_level_cost() {
        let zeros = [Cost::ZERO];
        let ones = [Cost::ZERO];
        let (c0, c1) = controllability_of(GateKind::Not, &zeros, &ones, Cost::ZERO);
        assert_eq!(c0, Cost::ZERO);
        assert_eq!(c1, Cost::ZERO);
    }
}
