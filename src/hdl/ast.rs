//! A small Verilog AST covering what memory wrappers need: port and net
//! declarations with unpacked dimensions, continuous assignments, clocked and
//! combinational always blocks, generate loops, tasks, and macro instances.
//! Building the module as a tree keeps slice arithmetic and assertion guards
//! in one place; `Module::render` pretty-prints it deterministically.

use std::fmt;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Mod,
    Eq,
    Ne,
    Gt,
    LogicalAnd,
    BitAnd,
    BitOr,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Gt => ">",
            BinOp::LogicalAnd => "&&",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
        }
    }
}

#[derive(PartialEq, Clone, Debug)]
pub enum Expr {
    Num(i64),
    Ident(String),
    /// A sized literal such as `1'b1`.
    SizedLiteral { width: u32, value: u64 },
    Index(Box<Expr>, Box<Expr>),
    Slice { base: Box<Expr>, msb: Box<Expr>, lsb: Box<Expr> },
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Paren(Box<Expr>),
}

impl Expr {
    pub fn num(value: i64) -> Expr {
        Expr::Num(value)
    }

    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Ident(name.into())
    }

    pub fn index(self, index: Expr) -> Expr {
        Expr::Index(Box::new(self), Box::new(index))
    }

    pub fn slice(self, msb: Expr, lsb: Expr) -> Expr {
        Expr::Slice {
            base: Box::new(self),
            msb: Box::new(msb),
            lsb: Box::new(lsb),
        }
    }

    pub fn paren(self) -> Expr {
        Expr::Paren(Box::new(self))
    }

    fn binary(self, op: BinOp, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    pub fn add(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Add, rhs)
    }

    pub fn sub(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Sub, rhs)
    }

    pub fn mul(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Mul, rhs)
    }

    pub fn rem(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Mod, rhs)
    }

    pub fn eq(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Eq, rhs)
    }

    pub fn ne(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Ne, rhs)
    }

    pub fn gt(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Gt, rhs)
    }

    pub fn and(self, rhs: Expr) -> Expr {
        self.binary(BinOp::LogicalAnd, rhs)
    }

    pub fn bit_and(self, rhs: Expr) -> Expr {
        self.binary(BinOp::BitAnd, rhs)
    }

    pub fn bit_or(self, rhs: Expr) -> Expr {
        self.binary(BinOp::BitOr, rhs)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(value) => write!(f, "{value}"),
            Expr::Ident(name) => write!(f, "{name}"),
            Expr::SizedLiteral { width, value } => write!(f, "{width}'b{value:b}"),
            Expr::Index(base, index) => write!(f, "{base}[{index}]"),
            Expr::Slice { base, msb, lsb } => write!(f, "{base}[{msb}:{lsb}]"),
            Expr::Binary { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.symbol()),
            Expr::Paren(inner) => write!(f, "({inner})"),
        }
    }
}

/// A `[msb:lsb]` declaration range. `msb` may be negative: a one-word memory
/// has a zero-width address declared as `[-1:0]`.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Range {
    pub msb: i64,
    pub lsb: i64,
}

impl Range {
    pub fn new(msb: i64, lsb: i64) -> Range {
        Range { msb, lsb }
    }

    /// The range covering `width` bits, `[width-1:0]`.
    pub fn bits(width: i64) -> Range {
        Range { msb: width - 1, lsb: 0 }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.msb, self.lsb)
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Direction {
    Input,
    Output,
}

#[derive(PartialEq, Clone, Debug)]
pub struct Port {
    pub direction: Direction,
    pub width: Option<Range>,
    pub name: String,
}

impl Port {
    pub fn input(name: impl Into<String>, width: Option<Range>) -> Port {
        Port {
            direction: Direction::Input,
            width,
            name: name.into(),
        }
    }

    pub fn output(name: impl Into<String>, width: Option<Range>) -> Port {
        Port {
            direction: Direction::Output,
            width,
            name: name.into(),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum NetKind {
    Reg,
    Wire,
    Integer,
}

#[derive(PartialEq, Clone, Debug)]
pub struct NetDecl {
    pub kind: NetKind,
    pub width: Option<Range>,
    pub name: String,
    pub dims: Vec<Range>,
}

impl NetDecl {
    pub fn new(kind: NetKind, width: Option<Range>, name: impl Into<String>, dims: Vec<Range>) -> NetDecl {
        NetDecl {
            kind,
            width,
            name: name.into(),
            dims,
        }
    }
}

#[derive(PartialEq, Clone, Debug)]
pub enum DisplayArg {
    Text(String),
    Expr(Expr),
}

#[derive(PartialEq, Clone, Debug)]
pub enum Stmt {
    Comment(String),
    Blank,
    /// Blocking assignment `lhs = rhs;`.
    Blocking(Expr, Expr),
    /// Non-blocking assignment `lhs <= rhs;`.
    NonBlocking(Expr, Expr),
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    TaskCall {
        task: String,
        args: Vec<Expr>,
    },
    Display(Vec<DisplayArg>),
    Finish,
    /// Statements emitted between `translate_off`/`translate_on` pragmas so
    /// they exist for simulation only.
    TranslateOff(Vec<Stmt>),
}

#[derive(PartialEq, Clone, Debug)]
pub struct TaskDecl {
    pub name: String,
    /// Names of `input integer` arguments, in declaration order.
    pub inputs: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(PartialEq, Clone, Debug)]
pub struct Instance {
    pub module: String,
    pub name: String,
    pub connections: Vec<(String, Expr)>,
}

#[derive(PartialEq, Clone, Debug)]
pub enum Item {
    Comment(String),
    Blank,
    Genvars(Vec<String>),
    Net(NetDecl),
    Task(TaskDecl),
    Assign(Expr, Expr),
    AlwaysClocked {
        clock: String,
        body: Vec<Stmt>,
    },
    AlwaysComb {
        label: String,
        body: Vec<Stmt>,
    },
    Generate(Vec<GenItem>),
    TranslateOff(Vec<Item>),
}

#[derive(PartialEq, Clone, Debug)]
pub enum GenItem {
    Blank,
    For {
        var: String,
        bound: i64,
        label: String,
        body: Vec<GenItem>,
    },
    /// A generate-level `if (cond) ... else ...` over single assignments.
    If {
        condition: Expr,
        then_assign: Box<GenItem>,
        else_assign: Option<Box<GenItem>>,
    },
    Assign(Expr, Expr),
    Instance(Instance),
    Item(Item),
}

#[derive(PartialEq, Clone, Debug)]
pub struct Module {
    pub name: String,
    pub ports: Vec<Port>,
    pub items: Vec<Item>,
}

impl Module {
    pub fn render(&self) -> String {
        let mut w = Writer::new();
        w.raw(&format!("module {}(", self.name));
        w.raw("    CLK");
        for port in &self.ports {
            w.append(",");
            w.raw(&format!("    {}", port.name));
        }
        w.raw("  );");

        w.indent = 1;
        w.line("input CLK;");
        for port in &self.ports {
            let direction = match port.direction {
                Direction::Input => "input",
                Direction::Output => "output",
            };
            match port.width {
                Some(width) => w.line(&format!("{direction} {width} {};", port.name)),
                None => w.line(&format!("{direction} {};", port.name)),
            }
        }

        for item in &self.items {
            render_item(&mut w, item);
        }

        w.indent = 0;
        w.line("endmodule");
        w.finish()
    }
}

struct Writer {
    out: String,
    indent: usize,
}

impl Writer {
    fn new() -> Writer {
        Writer {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }

        self.out.push_str(text);
        self.out.push('\n');
    }

    // A line that ignores the current indentation.
    fn raw(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    // Appends to the previously written line.
    fn append(&mut self, text: &str) {
        assert_eq!(self.out.pop(), Some('\n'));
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }
}

fn render_item(w: &mut Writer, item: &Item) {
    match item {
        Item::Comment(text) => w.line(text),
        Item::Blank => w.blank(),
        Item::Genvars(names) => w.line(&format!("genvar {};", names.join(", "))),
        Item::Net(decl) => render_net(w, decl),
        Item::Task(task) => render_task(w, task),
        Item::Assign(lhs, rhs) => w.line(&format!("assign {lhs} = {rhs};")),
        Item::AlwaysClocked { clock, body } => {
            w.line(&format!("always @(posedge {clock}) begin"));
            w.indent += 1;
            for stmt in body {
                render_stmt(w, stmt);
            }
            w.indent -= 1;
            w.line("end");
        }
        Item::AlwaysComb { label, body } => {
            w.line(&format!("always @(*) begin : {label}"));
            w.indent += 1;
            for stmt in body {
                render_stmt(w, stmt);
            }
            w.indent -= 1;
            w.line("end");
        }
        Item::Generate(items) => {
            w.line("generate");
            for item in items {
                render_gen_item(w, item);
            }
            w.line("endgenerate");
        }
        Item::TranslateOff(items) => {
            w.raw("// synthesis translate_off");
            for item in items {
                render_item(w, item);
            }
            w.raw("// synthesis translate_on");
        }
    }
}

fn render_net(w: &mut Writer, decl: &NetDecl) {
    let dims: String = decl.dims.iter().map(Range::to_string).collect();
    match decl.kind {
        NetKind::Integer => w.line(&format!("integer {} {dims};", decl.name)),
        kind => {
            let kind = match kind {
                NetKind::Reg => "reg",
                _ => "wire",
            };
            let width = match decl.width {
                Some(width) => width.to_string(),
                None => String::new(),
            };
            w.line(&format!("{kind:<4} {width:>12} {:<9}{dims};", decl.name));
        }
    }
}

fn render_task(w: &mut Writer, task: &TaskDecl) {
    w.line(&format!("task {};", task.name));
    w.indent += 1;
    for input in &task.inputs {
        w.line(&format!("input integer {input};"));
    }
    w.indent -= 1;
    w.line("begin");
    w.indent += 1;
    for stmt in &task.body {
        render_stmt(w, stmt);
    }
    w.indent -= 1;
    w.line("end");
    w.line("endtask");
}

fn render_stmt(w: &mut Writer, stmt: &Stmt) {
    match stmt {
        Stmt::Comment(text) => w.line(text),
        Stmt::Blank => w.blank(),
        Stmt::Blocking(lhs, rhs) => w.line(&format!("{lhs} = {rhs};")),
        Stmt::NonBlocking(lhs, rhs) => w.line(&format!("{lhs} <= {rhs};")),
        Stmt::If { condition, then_body, else_body } => {
            w.line(&format!("if ({condition}) begin"));
            w.indent += 1;
            for stmt in then_body {
                render_stmt(w, stmt);
            }
            w.indent -= 1;
            w.line("end");
            if !else_body.is_empty() {
                w.line("else begin");
                w.indent += 1;
                for stmt in else_body {
                    render_stmt(w, stmt);
                }
                w.indent -= 1;
                w.line("end");
            }
        }
        Stmt::TaskCall { task, args } => {
            let args: Vec<String> = args.iter().map(Expr::to_string).collect();
            w.line(&format!("{task}({});", args.join(", ")));
        }
        Stmt::Display(args) => {
            let args: Vec<String> = args.iter()
                .map(|arg| match arg {
                    DisplayArg::Text(text) => format!("\"{text}\""),
                    DisplayArg::Expr(expr) => expr.to_string(),
                })
                .collect();
            w.line(&format!("$display({});", args.join(", ")));
        }
        Stmt::Finish => w.line("$finish;"),
        Stmt::TranslateOff(stmts) => {
            w.raw("// synthesis translate_off");
            for stmt in stmts {
                render_stmt(w, stmt);
            }
            w.raw("// synthesis translate_on");
        }
    }
}

fn render_gen_item(w: &mut Writer, item: &GenItem) {
    match item {
        GenItem::Blank => w.blank(),
        GenItem::For { var, bound, label, body } => {
            w.line(&format!(
                "for ({var} = 0; {var} < {bound}; {var} = {var} + 1) begin : {label}"
            ));
            w.indent += 1;
            for item in body {
                render_gen_item(w, item);
            }
            w.indent -= 1;
            w.line("end");
        }
        GenItem::If { condition, then_assign, else_assign } => {
            w.line(&format!("if ({condition})"));
            w.indent += 1;
            render_gen_item(w, then_assign);
            w.indent -= 1;
            if let Some(else_assign) = else_assign {
                w.line("else");
                w.indent += 1;
                render_gen_item(w, else_assign);
                w.indent -= 1;
            }
        }
        GenItem::Assign(lhs, rhs) => w.line(&format!("assign {lhs} = {rhs};")),
        GenItem::Instance(instance) => {
            w.line(&format!("{} {}(", instance.module, instance.name));
            w.indent += 2;
            let last = instance.connections.len().saturating_sub(1);
            for (i, (port, expr)) in instance.connections.iter().enumerate() {
                let comma = if i == last { "" } else { "," };
                w.line(&format!(".{port}({expr}){comma}"));
            }
            w.indent -= 1;
            w.line(");");
            w.indent -= 1;
        }
        GenItem::Item(item) => render_item(w, item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_chains_render_flat() {
        let expr = Expr::ident("h")
            .rem(Expr::num(2))
            .eq(Expr::num(0))
            .and(Expr::ident("ce").eq(Expr::SizedLiteral { width: 1, value: 1 }));
        assert_eq!(expr.to_string(), "h % 2 == 0 && ce == 1'b1");
    }

    #[test]
    fn explicit_parens_render() {
        let expr = Expr::num(32)
            .mul(Expr::ident("hh").add(Expr::num(1)).paren())
            .sub(Expr::num(1));
        assert_eq!(expr.to_string(), "32 * (hh + 1) - 1");
    }

    #[test]
    fn index_chains_render() {
        let expr = Expr::ident("bank_CE")
            .index(Expr::num(0))
            .index(Expr::ident("h"))
            .index(Expr::ident("v"))
            .index(Expr::ident("hh"))
            .index(Expr::num(1));
        assert_eq!(expr.to_string(), "bank_CE[0][h][v][hh][1]");
    }

    #[test]
    fn slices_render_without_colon_spaces() {
        let expr = Expr::ident("mem_A0").slice(Expr::num(9), Expr::num(1));
        assert_eq!(expr.to_string(), "mem_A0[9:1]");
    }

    #[test]
    fn negative_range_renders() {
        assert_eq!(Range::bits(0).to_string(), "[-1:0]");
    }

    #[test]
    fn module_skeleton_renders() {
        let module = Module {
            name: "m".to_string(),
            ports: vec![
                Port::input("m_CE0", None),
                Port::input("m_A0", Some(Range::bits(10))),
                Port::output("m_Q1", Some(Range::bits(32))),
            ],
            items: vec![
                Item::Genvars(vec!["d".to_string(), "h".to_string()]),
                Item::Assign(Expr::ident("ctrlh").index(Expr::num(0)), Expr::num(0)),
            ],
        };

        let text = module.render();
        assert!(text.starts_with("module m(\n    CLK,\n    m_CE0,\n    m_A0,\n    m_Q1\n  );\n"));
        assert!(text.contains("  input CLK;\n"));
        assert!(text.contains("  input [9:0] m_A0;\n"));
        assert!(text.contains("  output [31:0] m_Q1;\n"));
        assert!(text.contains("  genvar d, h;\n"));
        assert!(text.contains("  assign ctrlh[0] = 0;\n"));
        assert!(text.ends_with("endmodule\n"));
    }

    #[test]
    fn translate_off_pragmas_ignore_indentation() {
        let module = Module {
            name: "m".to_string(),
            ports: Vec::new(),
            items: vec![Item::TranslateOff(vec![Item::Net(NetDecl::new(
                NetKind::Integer,
                None,
                "check_bank_access",
                vec![Range::new(1, 0)],
            ))])],
        };

        let text = module.render();
        assert!(text.contains("\n// synthesis translate_off\n"));
        assert!(text.contains("  integer check_bank_access [1:0];\n"));
        assert!(text.contains("\n// synthesis translate_on\n"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let module = Module {
            name: "m".to_string(),
            ports: vec![Port::input("m_CE0", None)],
            items: vec![Item::Assign(Expr::ident("x"), Expr::num(1))],
        };
        assert_eq!(module.render(), module.render());
    }
}
