//! Builds the wrapper module for one planned memory: external interfaces on
//! one side, a `[dbanks][hbanks][vbanks][hhbanks][ports]` array of SRAM
//! instances on the other, and the routing fabric in between.
//!
//! The fabric is a sparsely gated cross-bar. Every interface is wired toward
//! every bank coordinate and the per-interface predicates select the live
//! paths; constant propagation during synthesis trims the rest. The shape is
//! deliberate and must not be pre-pruned here.

use crate::hdl::ast::{
    DisplayArg, Expr, GenItem, Instance, Item, Module, NetDecl, NetKind, Port, Range, Stmt,
    TaskDecl,
};
use crate::memory::operation::{AccessPattern, Operation};
use crate::memory::planner::BankingPlan;
use crate::memory::request::MemoryRequest;
use crate::util;

/// Builds the complete wrapper module for a planned request.
pub fn build(request: &MemoryRequest, plan: &BankingPlan, assertions: bool) -> Module {
    WrapperBuilder::new(request, plan, assertions).build()
}

struct WrapperBuilder<'a> {
    request: &'a MemoryRequest,
    plan: &'a BankingPlan,
    assertions: bool,

    write_interfaces: u64,
    read_interfaces: u64,
    dbanks: u64,
    hbanks: u64,
    vbanks: u64,
    hhbanks: u64,
    ports: u64,
    bank_width: i64,

    addr_width: i64,
    bank_addr_width: i64,
    sel_d_width: i64,
    sel_h_width: i64,
    sel_v_width: i64,
}

impl<'a> WrapperBuilder<'a> {
    fn new(request: &'a MemoryRequest, plan: &'a BankingPlan, assertions: bool) -> WrapperBuilder<'a> {
        WrapperBuilder {
            request,
            plan,
            assertions,

            write_interfaces: plan.write_interfaces,
            read_interfaces: plan.read_interfaces,
            dbanks: plan.duplication_factor,
            hbanks: plan.distribution_factor,
            vbanks: plan.vbanks,
            hhbanks: plan.hhbanks,
            ports: plan.bank_type.ports(),
            bank_width: plan.bank_type.width() as i64,

            addr_width: util::ceil_log2(request.words()),
            bank_addr_width: util::ceil_log2(plan.bank_type.words()),
            sel_d_width: util::ceil_log2(plan.duplication_factor),
            sel_h_width: util::ceil_log2(plan.distribution_factor),
            sel_v_width: util::ceil_log2(plan.vbanks),
        }
    }

    fn build(&self) -> Module {
        let mut items = vec![
            Item::Genvars(vec!["d".to_string(), "h".to_string(), "v".to_string(), "hh".to_string()]),
            Item::Blank,
        ];
        items.extend(self.bank_declarations());
        if self.assertions {
            items.push(Item::TranslateOff(vec![
                Item::Net(NetDecl::new(NetKind::Integer, None, "check_bank_access", self.bank_dims())),
                Item::Blank,
                Item::Task(self.check_access_task()),
            ]));
        }
        items.push(Item::Blank);
        items.extend(self.control_assigns());
        items.push(Item::Blank);
        items.push(self.sel_latch());
        items.push(Item::Blank);
        items.push(self.control_generate());
        items.push(Item::Blank);
        items.push(self.readback_generate());
        items.push(Item::Blank);
        items.push(self.instance_generate());
        items.push(Item::Blank);

        Module {
            name: self.request.name().to_string(),
            ports: self.interface_ports(),
            items,
        }
    }

    fn interfaces(&self) -> u64 {
        self.write_interfaces + self.read_interfaces
    }

    fn width(&self) -> i64 {
        self.request.width() as i64
    }

    // External signal of one interface, e.g. `accbuf_CE3`.
    fn iface(&self, signal: &str, iface: u64) -> Expr {
        Expr::ident(format!("{}_{signal}{iface}", self.request.name()))
    }

    fn interface_ports(&self) -> Vec<Port> {
        let addr = Some(Range::bits(self.addr_width));
        let data = Some(Range::bits(self.width()));

        let mut ports = Vec::new();
        for i in 0..self.write_interfaces {
            let name = self.request.name();
            ports.push(Port::input(format!("{name}_CE{i}"), None));
            ports.push(Port::input(format!("{name}_A{i}"), addr));
            ports.push(Port::input(format!("{name}_D{i}"), data));
            ports.push(Port::input(format!("{name}_WE{i}"), None));
            ports.push(Port::input(format!("{name}_WEM{i}"), data));
        }

        for i in self.write_interfaces..self.interfaces() {
            let name = self.request.name();
            ports.push(Port::input(format!("{name}_CE{i}"), None));
            ports.push(Port::input(format!("{name}_A{i}"), addr));
            ports.push(Port::output(format!("{name}_Q{i}"), data));
        }

        ports
    }

    // The [dbanks][hbanks][vbanks][hhbanks][ports] shape shared by every
    // per-bank signal family.
    fn bank_dims(&self) -> Vec<Range> {
        vec![
            Range::bits(self.dbanks as i64),
            Range::bits(self.hbanks as i64),
            Range::bits(self.vbanks as i64),
            Range::bits(self.hhbanks as i64),
            Range::bits(self.ports as i64),
        ]
    }

    fn selector_range(&self, count: u64, width: i64) -> Range {
        if count > 1 {
            Range::bits(width)
        } else {
            Range::new(0, 0)
        }
    }

    fn bank_declarations(&self) -> Vec<Item> {
        let dims = self.bank_dims();
        let bank_addr = Some(Range::bits(self.bank_addr_width));
        let bank_data = Some(Range::bits(self.bank_width));
        let sel_d = Some(self.selector_range(self.dbanks, self.sel_d_width));
        let sel_h = Some(self.selector_range(self.hbanks, self.sel_h_width));
        let sel_v = Some(self.selector_range(self.vbanks, self.sel_v_width));
        let all_ifaces = Range::new(self.interfaces() as i64 - 1, 0);
        let read_ifaces = Range::new(self.interfaces() as i64 - 1, self.write_interfaces as i64);

        vec![
            Item::Net(NetDecl::new(NetKind::Reg, None, "bank_CE", dims.clone())),
            Item::Net(NetDecl::new(NetKind::Reg, bank_addr, "bank_A", dims.clone())),
            Item::Net(NetDecl::new(NetKind::Reg, bank_data, "bank_D", dims.clone())),
            Item::Net(NetDecl::new(NetKind::Reg, None, "bank_WE", dims.clone())),
            Item::Net(NetDecl::new(NetKind::Reg, bank_data, "bank_WEM", dims.clone())),
            Item::Net(NetDecl::new(NetKind::Wire, bank_data, "bank_Q", dims)),
            Item::Net(NetDecl::new(NetKind::Wire, sel_d, "ctrld", vec![read_ifaces])),
            Item::Net(NetDecl::new(NetKind::Wire, sel_h, "ctrlh", vec![all_ifaces])),
            Item::Net(NetDecl::new(NetKind::Wire, sel_v, "ctrlv", vec![all_ifaces])),
            Item::Net(NetDecl::new(NetKind::Reg, sel_d, "seld", vec![read_ifaces])),
            Item::Net(NetDecl::new(NetKind::Reg, sel_h, "selh", vec![read_ifaces])),
            Item::Net(NetDecl::new(NetKind::Reg, sel_v, "selv", vec![read_ifaces])),
        ]
    }

    fn check_access_task(&self) -> TaskDecl {
        let inputs = ["iface", "d", "h", "v", "hh", "p"];
        let slot = indexed(
            "check_bank_access",
            inputs[1..].iter().map(|name| Expr::ident(*name)).collect(),
        );

        let condition = slot.clone().ne(Expr::num(-1)).paren()
            .and(slot.clone().ne(Expr::ident("iface")).paren());
        let display = vec![
            DisplayArg::Text("ASSERTION FAILED in %m: port conflict on bank".to_string()),
            DisplayArg::Expr(Expr::ident("h")),
            DisplayArg::Text("h".to_string()),
            DisplayArg::Expr(Expr::ident("v")),
            DisplayArg::Text("v".to_string()),
            DisplayArg::Expr(Expr::ident("hh")),
            DisplayArg::Text("hh".to_string()),
            DisplayArg::Text(" for port".to_string()),
            DisplayArg::Expr(Expr::ident("p")),
            DisplayArg::Text(" involving interfaces".to_string()),
            DisplayArg::Expr(slot.clone()),
            DisplayArg::Expr(Expr::ident("iface")),
        ];

        TaskDecl {
            name: "check_access".to_string(),
            inputs: inputs.iter().map(|name| name.to_string()).collect(),
            body: vec![Stmt::If {
                condition,
                then_body: vec![Stmt::Display(display), Stmt::Finish],
                else_body: vec![Stmt::Blocking(slot, Expr::ident("iface"))],
            }],
        }
    }

    fn control_assigns(&self) -> Vec<Item> {
        let mut items = Vec::new();

        // Reads round-robin over the duplicated sets so concurrent
        // unknown-pattern readers land on distinct copies.
        for ri in self.write_interfaces..self.interfaces() {
            let value = if self.dbanks > 1 {
                Expr::num((ri % self.dbanks) as i64)
            } else {
                Expr::num(0)
            };
            items.push(Item::Assign(Expr::ident("ctrld").index(Expr::num(ri as i64)), value));
        }

        for i in 0..self.interfaces() {
            let value = if self.hbanks > 1 {
                self.iface("A", i).slice(Expr::num(self.sel_h_width - 1), Expr::num(0))
            } else {
                Expr::num(0)
            };
            items.push(Item::Assign(Expr::ident("ctrlh").index(Expr::num(i as i64)), value));
        }

        for i in 0..self.interfaces() {
            let value = if self.vbanks > 1 {
                self.iface("A", i).slice(
                    Expr::num(self.bank_addr_width + self.sel_h_width + self.sel_v_width - 1),
                    Expr::num(self.bank_addr_width + self.sel_h_width),
                )
            } else {
                Expr::num(0)
            };
            items.push(Item::Assign(Expr::ident("ctrlv").index(Expr::num(i as i64)), value));
        }

        items
    }

    // One register stage aligns the read multiplexer selectors with the
    // synchronous read latency of the banks.
    fn sel_latch(&self) -> Item {
        let mut body = Vec::new();
        for ri in self.write_interfaces..self.interfaces() {
            let ri = Expr::num(ri as i64);
            for sel in ["d", "h", "v"] {
                body.push(Stmt::NonBlocking(
                    Expr::ident(format!("sel{sel}")).index(ri.clone()),
                    Expr::ident(format!("ctrl{sel}")).index(ri.clone()),
                ));
            }
        }

        Item::AlwaysClocked {
            clock: "CLK".to_string(),
            body,
        }
    }

    fn control_generate(&self) -> Item {
        let always = Item::AlwaysComb {
            label: "handle_ops".to_string(),
            body: self.handle_ops(),
        };

        Item::Generate(vec![gen_for("h", self.hbanks, "gen_ctrl_hbanks", vec![
            gen_for("v", self.vbanks, "gen_ctrl_vbanks", vec![
                gen_for("hh", self.hhbanks, "gen_ctrl_hhbanks", vec![
                    GenItem::Blank,
                    GenItem::Item(always),
                    GenItem::Blank,
                ]),
            ]),
        ])])
    }

    fn handle_ops(&self) -> Vec<Stmt> {
        let mut body = vec![Stmt::Blank, Stmt::Comment("/** Default **/".to_string())];
        for d in 0..self.dbanks {
            for p in 0..self.ports {
                if self.assertions {
                    body.push(Stmt::TranslateOff(vec![Stmt::Blocking(
                        self.bank_slot("check_bank_access", Expr::num(d as i64), Expr::num(p as i64)),
                        Expr::num(-1),
                    )]));
                }

                for signal in ["bank_CE", "bank_A", "bank_D", "bank_WE", "bank_WEM"] {
                    body.push(Stmt::Blocking(
                        self.bank_slot(signal, Expr::num(d as i64), Expr::num(p as i64)),
                        Expr::num(0),
                    ));
                }
            }

            body.push(Stmt::Blank);
        }

        for op in self.request.ops() {
            body.push(Stmt::Comment(format!("/** Handle {op} **/")));
            self.handle_op(&mut body, op);
            body.push(Stmt::Blank);
        }

        body
    }

    // The five routing kernels. An op may match more than one shape; each
    // match appends its assignments in a fixed order.
    fn handle_op(&self, body: &mut Vec<Stmt>, op: &Operation) {
        let write_interfaces = self.write_interfaces;
        let modulo_write = op.write_pattern == AccessPattern::Modulo;
        let modulo_read = op.read_pattern == AccessPattern::Modulo;

        // Two unknown-pattern writes: bind each write to its own physical
        // port of every duplicated set.
        if !modulo_write && op.write_count == 2 {
            for d in 0..self.dbanks {
                body.push(Stmt::Comment(format!("// Duplicated bank set {d}")));
                for wi in 0..op.write_count {
                    self.ctrl_assignment(body, d, wi % self.ports, wi, true, 0);
                }
            }
        }

        // Modulo writes with no reads: write to every duplicated set.
        if op.read_count == 0 && modulo_write {
            for d in 0..self.dbanks {
                body.push(Stmt::Comment(format!("// Duplicated bank set {d}")));
                for wi in 0..op.write_count {
                    let port = if self.plan.need_parallel_rw {
                        0
                    } else {
                        (wi / self.hbanks + wi % self.ports) % self.ports
                    };
                    self.ctrl_assignment(body, d, port, wi, true, op.write_count);
                }
            }
        }

        // Modulo reads with no writes: every duplicated set holds the same
        // data, so set 0 serves all readers.
        if op.write_count == 0 && modulo_read {
            body.push(Stmt::Comment("// Always choose duplicated bank set 0".to_string()));
            for ri in 0..op.read_count {
                let port = if self.plan.need_parallel_rw {
                    1
                } else {
                    (ri / self.hbanks + ri % self.ports) % self.ports
                };
                self.ctrl_assignment(body, 0, port, ri + write_interfaces, false, op.read_count);
            }
        }

        // Modulo reads and writes in the same cycle: writes own port 0 of
        // every set, reads own port 1 of set 0.
        if op.write_count > 0 && op.read_count > 0 && modulo_write && modulo_read {
            for d in 0..self.dbanks {
                body.push(Stmt::Comment(format!("// Duplicated bank set {d}")));
                for wi in 0..op.write_count {
                    self.ctrl_assignment(body, d, 0, wi, true, op.write_count);
                }
            }

            body.push(Stmt::Comment("// Always choose duplicated bank set 0".to_string()));
            for ri in 0..op.read_count {
                self.ctrl_assignment(body, 0, 1, ri + write_interfaces, false, op.read_count);
            }
        }

        // Unknown-pattern reads with no writes: reader ri owns duplicated
        // set ri mod dbanks, alternating ports within a set.
        if op.read_count > 1 && op.write_count == 0 && !modulo_read {
            for ri in 0..op.read_count {
                let port = (ri / self.dbanks + ri % self.ports) % self.ports;
                self.ctrl_assignment(body, ri % self.dbanks, port, ri + write_interfaces, false, 0);
            }
        }

        // Unknown-pattern reads combined with modulo writes: writes are
        // replicated to port 0 of every set, reads stay on port 1.
        if op.read_count > 1 && op.write_count > 0 && !modulo_read && modulo_write {
            for d in 0..self.dbanks {
                body.push(Stmt::Comment(format!("// Duplicated bank set {d}")));
                for wi in 0..op.write_count {
                    self.ctrl_assignment(body, d, 0, wi, true, op.write_count);
                }
            }

            for ri in 0..op.read_count {
                self.ctrl_assignment(body, ri % self.dbanks, 1, ri + write_interfaces, false, 0);
            }
        }
    }

    // One gated routing conditional: if the interface addresses this bank
    // coordinate and is enabled, its signals drive the chosen physical port.
    fn ctrl_assignment(
        &self,
        body: &mut Vec<Stmt>,
        duplicated_set: u64,
        port: u64,
        iface: u64,
        is_write: bool,
        parallelism: u64,
    ) {
        let d = Expr::num(duplicated_set as i64);
        let p = Expr::num(port as i64);
        let iface_num = Expr::num(iface as i64);

        let bank_addr_msb = (self.addr_width - 1).min(self.bank_addr_width + self.sel_h_width - 1);
        let bank_addr = self.iface("A", iface)
            .slice(Expr::num(bank_addr_msb), Expr::num(self.sel_h_width));

        let mut assignments = Vec::new();
        if self.assertions {
            assignments.push(Stmt::TranslateOff(vec![Stmt::TaskCall {
                task: "check_access".to_string(),
                args: vec![
                    iface_num,
                    d.clone(),
                    Expr::ident("h"),
                    Expr::ident("v"),
                    Expr::ident("hh"),
                    p.clone(),
                ],
            }]));
        }

        assignments.push(Stmt::Blocking(
            self.bank_slot("bank_CE", d.clone(), p.clone()),
            self.iface("CE", iface),
        ));
        assignments.push(Stmt::Blocking(self.bank_slot("bank_A", d.clone(), p.clone()), bank_addr));
        if is_write {
            assignments.push(Stmt::Blocking(
                self.bank_slot("bank_D", d.clone(), p.clone()),
                self.iface("D", iface).slice(self.column_msb(), self.column_lsb()),
            ));
            assignments.push(Stmt::Blocking(
                self.bank_slot("bank_WE", d.clone(), p.clone()),
                self.iface("WE", iface),
            ));
            assignments.push(Stmt::Blocking(
                self.bank_slot("bank_WEM", d, p),
                self.iface("WEM", iface).slice(self.column_msb(), self.column_lsb()),
            ));
        }

        let targeted = Expr::ident("ctrlh").index(Expr::num(iface as i64)).eq(Expr::ident("h"))
            .and(Expr::ident("ctrlv").index(Expr::num(iface as i64)).eq(Expr::ident("v")))
            .and(self.iface("CE", iface).eq(Expr::SizedLiteral { width: 1, value: 1 }));
        let gated = Stmt::If {
            condition: targeted,
            then_body: assignments,
            else_body: Vec::new(),
        };

        // Ops whose parallelism is below the distribution factor steer their
        // interfaces to disjoint subsets of the h-banks.
        if parallelism != 0 {
            let normalized_iface = if is_write {
                iface % self.hbanks
            } else {
                (iface - self.write_interfaces) % self.hbanks
            };
            let normalized_parallelism = parallelism.min(self.hbanks);
            body.push(Stmt::If {
                condition: Expr::ident("h")
                    .rem(Expr::num(normalized_parallelism as i64))
                    .eq(Expr::num(normalized_iface as i64)),
                then_body: vec![gated],
                else_body: Vec::new(),
            });
        } else {
            body.push(gated);
        }
    }

    // The bit slice of the external data bus owned by width column hh.
    fn column_msb(&self) -> Expr {
        Expr::num(self.bank_width)
            .mul(Expr::ident("hh").add(Expr::num(1)).paren())
            .sub(Expr::num(1))
    }

    fn column_lsb(&self) -> Expr {
        Expr::num(self.bank_width).mul(Expr::ident("hh"))
    }

    fn bank_slot(&self, signal: &str, d: Expr, p: Expr) -> Expr {
        indexed(signal, vec![d, Expr::ident("h"), Expr::ident("v"), Expr::ident("hh"), p])
    }

    fn readback_generate(&self) -> Item {
        let mut body = Vec::new();
        for ri in self.write_interfaces..self.interfaces() {
            let port = if self.ports == 1 {
                0
            } else if self.plan.need_parallel_rw {
                1
            } else {
                ri % self.ports
            };

            let selected = indexed("bank_Q", vec![
                Expr::ident("seld").index(Expr::num(ri as i64)),
                Expr::ident("selh").index(Expr::num(ri as i64)),
                Expr::ident("selv").index(Expr::num(ri as i64)),
                Expr::ident("hh"),
                Expr::num(port as i64),
            ]);

            // The top column may be narrower than the macro: clip both the
            // external slice and the bank output.
            let last_msb = (self.width() - 1).min(self.hhbanks as i64 * self.bank_width - 1);
            let narrowed = GenItem::Assign(
                self.iface("Q", ri).slice(Expr::num(last_msb), self.column_lsb()),
                selected.clone().slice(Expr::num((self.width() - 1) % self.bank_width), Expr::num(0)),
            );
            let full = GenItem::Assign(
                self.iface("Q", ri).slice(self.column_msb(), self.column_lsb()),
                selected,
            );

            body.push(GenItem::If {
                condition: Expr::ident("hh").eq(Expr::num(self.hhbanks as i64 - 1)).and(
                    Expr::ident("hh").add(Expr::num(1)).paren()
                        .mul(Expr::num(self.bank_width))
                        .gt(Expr::num(self.width())),
                ),
                then_assign: Box::new(narrowed),
                else_assign: Some(Box::new(full)),
            });
        }

        Item::Generate(vec![gen_for("hh", self.hhbanks, "gen_q_assign_hhbanks", body)])
    }

    fn instance_generate(&self) -> Item {
        let mut connections = vec![("CLK".to_string(), Expr::ident("CLK"))];
        for p in 0..self.ports {
            for signal in ["CE", "A", "D", "WE", "WEM", "Q"] {
                connections.push((
                    format!("{signal}{p}"),
                    self.bank_slot(&format!("bank_{signal}"), Expr::ident("d"), Expr::num(p as i64)),
                ));
            }
        }

        let mut body = vec![
            GenItem::Blank,
            GenItem::Instance(Instance {
                module: self.plan.bank_type.name().to_string(),
                name: "bank_i".to_string(),
                connections,
            }),
            GenItem::Blank,
        ];

        if self.assertions && self.ports > 1 {
            body.push(GenItem::Item(Item::TranslateOff(vec![Item::AlwaysClocked {
                clock: "CLK".to_string(),
                body: self.write_collision_checks(),
            }])));
            body.push(GenItem::Blank);
        }

        Item::Generate(vec![gen_for("d", self.dbanks, "gen_wires_dbanks", vec![
            gen_for("h", self.hbanks, "gen_wires_hbanks", vec![
                gen_for("v", self.vbanks, "gen_wires_vbanks", vec![
                    gen_for("hh", self.hhbanks, "gen_wires_hhbanks", body),
                ]),
            ]),
        ])])
    }

    // Both ports of a dual-port bank must never write the same address in
    // the same cycle.
    fn write_collision_checks(&self) -> Vec<Stmt> {
        let d = Expr::ident("d");
        let mut checks = Vec::new();
        for p0 in 0..self.ports {
            for p1 in p0 + 1..self.ports {
                let p0 = Expr::num(p0 as i64);
                let p1 = Expr::num(p1 as i64);
                let both_enabled = self.bank_slot("bank_CE", d.clone(), p0.clone())
                    .bit_and(self.bank_slot("bank_CE", d.clone(), p1.clone()))
                    .paren();
                let either_writes = self.bank_slot("bank_WE", d.clone(), p0.clone())
                    .bit_or(self.bank_slot("bank_WE", d.clone(), p1.clone()))
                    .paren();
                let same_address = self.bank_slot("bank_A", d.clone(), p0)
                    .eq(self.bank_slot("bank_A", d.clone(), p1))
                    .paren();

                checks.push(Stmt::If {
                    condition: both_enabled.and(either_writes).and(same_address),
                    then_body: vec![
                        Stmt::Display(vec![
                            DisplayArg::Text(
                                "ASSERTION FAILED in %m: address conflict on bank".to_string(),
                            ),
                            DisplayArg::Expr(Expr::ident("h")),
                            DisplayArg::Text("h".to_string()),
                            DisplayArg::Expr(Expr::ident("v")),
                            DisplayArg::Text("v".to_string()),
                            DisplayArg::Expr(Expr::ident("hh")),
                            DisplayArg::Text("hh".to_string()),
                        ]),
                        Stmt::Finish,
                    ],
                    else_body: Vec::new(),
                });
            }
        }

        checks
    }
}

fn indexed(name: &str, indices: Vec<Expr>) -> Expr {
    indices.into_iter().fold(Expr::ident(name), Expr::index)
}

fn gen_for(var: &str, bound: u64, label: &str, body: Vec<GenItem>) -> GenItem {
    GenItem::For {
        var: var.to_string(),
        bound: bound as i64,
        label: label.to_string(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{SramMacro, TechLibrary};
    use crate::memory::planner;

    fn library() -> TechLibrary {
        TechLibrary::from_macros(vec![
            SramMacro::new("SRAM_1024x32_1P", 1024, 32, 1.0, 1),
            SramMacro::new("SRAM_1024x32_2P", 1024, 32, 1.8, 2),
        ])
    }

    fn render(name: &str, words: u64, width: u64, tokens: &[&str]) -> String {
        let ops = tokens.iter()
            .map(|token| Operation::parse(token, words).unwrap())
            .collect();
        let request = MemoryRequest::new(name, words, width, ops).unwrap();
        let plan = planner::plan(&request, &library()).unwrap();
        build(&request, &plan, true).render()
    }

    fn count(text: &str, needle: &str) -> usize {
        text.matches(needle).count()
    }

    #[test]
    fn declares_clk_and_interface_tuples_in_order() {
        let text = render("m", 1024, 32, &["1w:1r"]);
        assert!(text.starts_with("module m(\n    CLK,\n    m_CE0,\n    m_A0,\n    m_D0,\n    m_WE0,\n    m_WEM0,\n    m_CE1,\n    m_A1,\n    m_Q1\n  );\n"));
        assert!(text.contains("  input [9:0] m_A0;\n"));
        assert!(text.contains("  input [31:0] m_D0;\n"));
        assert!(text.contains("  output [31:0] m_Q1;\n"));
    }

    #[test]
    fn scalar_port_count_matches_interfaces() {
        // 1 CLK + 5 per write interface + 3 per read interface.
        let text = render("m", 1024, 32, &["4w:4r"]);
        assert_eq!(count(&text, "\n  input "), 1 + 5 * 4 + 2 * 4);
        assert_eq!(count(&text, "\n  output "), 4);
    }

    #[test]
    fn one_word_memory_keeps_degenerate_address_range() {
        let text = render("m", 1, 1, &["0w:1r"]);
        assert!(text.contains("  input [-1:0] m_A0;\n"));
    }

    #[test]
    fn parallel_rw_routes_writes_to_port_zero_and_reads_to_port_one() {
        let text = render("m", 1024, 32, &["1w:1r"]);
        assert!(text.contains("bank_CE[0][h][v][hh][0] = m_CE0;"));
        assert!(text.contains("bank_CE[0][h][v][hh][1] = m_CE1;"));
        assert!(text.contains("assign m_Q1[32 * (hh + 1) - 1:32 * hh] = bank_Q[seld[1]][selh[1]][selv[1]][hh][1];"));
    }

    #[test]
    fn unknown_writes_bind_each_write_to_its_own_port() {
        let text = render("m", 1024, 32, &["2wu:0r"]);
        assert!(text.contains("bank_CE[0][h][v][hh][0] = m_CE0;"));
        assert!(text.contains("bank_CE[0][h][v][hh][1] = m_CE1;"));
    }

    #[test]
    fn unknown_reads_round_robin_over_duplicated_sets() {
        let text = render("m", 1024, 32, &["4ru:0w"]);
        assert!(text.contains("assign ctrld[1] = 1;\n"));
        assert!(text.contains("assign ctrld[2] = 0;\n"));
        assert!(text.contains("assign ctrld[3] = 1;\n"));
        assert!(text.contains("assign ctrld[4] = 0;\n"));
        assert!(text.contains("bank_CE[1][h][v][hh]["));
    }

    #[test]
    fn modulo_parallelism_gates_disjoint_bank_subsets() {
        let text = render("m", 1024, 32, &["4w:4r"]);
        for i in 0..4 {
            assert!(text.contains(&format!("if (h % 4 == {i}) begin")));
        }
    }

    #[test]
    fn mixed_parallelism_normalizes_interfaces_to_hbanks() {
        let text = render("m", 1024, 32, &["4w:0r", "0w:2r"]);
        // hbanks = 2: the four writes fold onto two bank subsets.
        assert!(text.contains("if (h % 2 == 0) begin"));
        assert!(text.contains("if (h % 2 == 1) begin"));
        assert!(!text.contains("if (h % 4 =="));
    }

    #[test]
    fn conflict_check_emitted_per_kernel_interface() {
        let text = render("m", 1024, 32, &["4w:4r"]);
        assert_eq!(count(&text, "check_access("), 4 + 4);
        assert!(text.contains("task check_access;"));
        assert!(text.contains("integer check_bank_access "));
    }

    #[test]
    fn assertions_can_be_disabled() {
        let ops = vec![Operation::parse("1w:1r", 1024).unwrap()];
        let request = MemoryRequest::new("m", 1024, 32, ops).unwrap();
        let plan = planner::plan(&request, &library()).unwrap();
        let text = build(&request, &plan, false).render();
        assert!(!text.contains("check_access"));
        assert!(!text.contains("translate_off"));
        assert!(!text.contains("$finish"));
    }

    #[test]
    fn single_port_banks_emit_no_collision_check() {
        let text = render("m", 2048, 32, &["0w:1r", "1w:0r"]);
        assert!(text.contains("SRAM_1024x32_1P bank_i("));
        assert!(!text.contains("address conflict"));
    }

    #[test]
    fn dual_port_banks_check_same_address_writes() {
        let text = render("m", 1024, 32, &["1w:1r"]);
        assert!(text.contains(
            "if ((bank_CE[d][h][v][hh][0] & bank_CE[d][h][v][hh][1]) && (bank_WE[d][h][v][hh][0] | bank_WE[d][h][v][hh][1]) && (bank_A[d][h][v][hh][0] == bank_A[d][h][v][hh][1])) begin"
        ));
        assert!(text.contains("$finish;"));
    }

    #[test]
    fn vertical_selector_uses_address_bits_above_bank_and_h_fields() {
        // words = 4096, hbanks = 2 -> 2048 words per hbank -> vbanks = 2.
        let text = render("m", 4096, 32, &["0w:4r"]);
        assert!(text.contains("assign ctrlh[1] = m_A1[0:0];\n"));
        assert!(text.contains("assign ctrlv[1] = m_A1[11:11];\n"));
    }

    #[test]
    fn width_stacking_narrows_the_top_column() {
        let text = render("m", 1024, 60, &["1w:1r"]);
        assert!(text.contains("if (hh == 1 && (hh + 1) * 32 > 60)"));
        assert!(text.contains("assign m_Q1[59:32 * hh] = bank_Q[seld[1]][selh[1]][selv[1]][hh][1][27:0];"));
    }

    #[test]
    fn bank_array_covers_all_five_dimensions() {
        let text = render("m", 4096, 64, &["0w:4r"]);
        // dbanks = 1, hbanks = 2, vbanks = 2, hhbanks = 2, ports = 2.
        assert!(text.contains("bank_CE  [0:0][1:0][1:0][1:0][1:0];"));
        assert!(text.contains("for (d = 0; d < 1; d = d + 1) begin : gen_wires_dbanks"));
        assert!(text.contains("for (hh = 0; hh < 2; hh = hh + 1) begin : gen_wires_hhbanks"));
    }

    #[test]
    fn rendering_twice_is_identical() {
        assert_eq!(render("m", 2048, 32, &["0w:4r"]), render("m", 2048, 32, &["0w:4r"]));
    }
}
