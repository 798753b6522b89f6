pub mod ast;
pub mod wrapper;

use self::ast::Module;

/// Renders a complete Verilog source file: generator banner, timescale
/// directive, then the module itself. Rendering is deterministic, so
/// re-running the compiler on the same inputs reproduces the file byte for
/// byte.
pub fn render_source(module: &Module) -> String {
    let mut text = String::new();
    text.push_str("/**\n");
    text.push_str(" * Generated by the memgen memory compiler.\n");
    text.push_str(" * Do not edit: regenerate from the memory list instead.\n");
    text.push_str(" */\n");
    text.push('\n');
    text.push_str("`timescale 1 ps / 1 ps\n");
    text.push('\n');
    text.push_str(&module.render());
    text
}
