extern crate memgen;

use std::fs;

use memgen::compiler;
use memgen::config::Config;
use memgen::error::MemgenError;
use memgen::hdl::{self, wrapper};
use memgen::library::{SramMacro, TechLibrary};
use memgen::memory::operation::Operation;
use memgen::memory::planner::{self, BankingPlan};
use memgen::memory::request::MemoryRequest;

fn library() -> TechLibrary {
    TechLibrary::from_macros(vec![
        SramMacro::new("SRAM_1024x32_1P", 1024, 32, 1.0, 1),
        SramMacro::new("SRAM_1024x32_2P", 1024, 32, 1.8, 2),
    ])
}

fn request(words: u64, width: u64, tokens: &[&str]) -> MemoryRequest {
    let ops: Vec<Operation> = tokens.iter()
        .map(|token| Operation::parse(token, words).unwrap())
        .collect();
    MemoryRequest::new("mem", words, width, ops).unwrap()
}

fn plan(words: u64, width: u64, tokens: &[&str]) -> BankingPlan {
    planner::plan(&request(words, width, tokens), &library()).unwrap()
}

fn emit(words: u64, width: u64, tokens: &[&str]) -> String {
    let request = request(words, width, tokens);
    let plan = planner::plan(&request, &library()).unwrap();
    hdl::render_source(&wrapper::build(&request, &plan, true))
}

#[test]
fn parallel_read_write_chooses_dual_port_without_banking() {
    let plan = plan(1024, 32, &["1w:1r"]);
    assert!(plan.need_parallel_rw);
    assert!(plan.need_dual_port);
    assert_eq!(plan.bank_type.name(), "SRAM_1024x32_2P");
    assert_eq!(plan.duplication_factor, 1);
    assert_eq!(plan.distribution_factor, 1);
    assert_eq!(plan.vbanks, 1);
    assert_eq!(plan.hhbanks, 1);
    assert_eq!(plan.area, 1.8);
}

#[test]
fn four_modulo_reads_distribute_and_stack_vertically() {
    let plan = plan(2048, 32, &["0w:4r"]);
    assert!(plan.need_dual_port);
    assert_eq!(plan.duplication_factor, 1);
    assert_eq!(plan.distribution_factor, 2);
    assert_eq!(plan.vbanks, 1);
    assert_eq!(plan.area, 2.0 * 1.8);
}

#[test]
fn four_unknown_reads_duplicate_the_structure() {
    let plan = plan(1024, 32, &["4ru:0w"]);
    assert_eq!(plan.duplication_factor, 2);
    assert_eq!(plan.distribution_factor, 1);
    assert_eq!(plan.bank_type.name(), "SRAM_1024x32_2P");
    assert_eq!(plan.area, 2.0 * 1.8);
}

#[test]
fn two_unknown_writes_split_across_physical_ports() {
    let plan = plan(1024, 32, &["2wu:0r"]);
    assert!(plan.need_dual_port);
    assert_eq!(plan.duplication_factor, 1);
    assert_eq!(plan.distribution_factor, 1);
    assert_eq!(plan.area, 1.8);

    let text = emit(1024, 32, &["2wu:0r"]);
    assert!(text.contains("bank_CE[0][h][v][hh][0] = mem_CE0;"));
    assert!(text.contains("bank_CE[0][h][v][hh][1] = mem_CE1;"));
}

#[test]
fn parallel_read_write_without_dual_port_macro_fails() {
    let single_port = TechLibrary::from_macros(
        vec![SramMacro::new("SRAM_1024x32_1P", 1024, 32, 1.0, 1)]);
    let result = planner::plan(&request(4096, 64, &["1w:1r"]), &single_port);
    assert!(matches!(result, Err(MemgenError::NoSuitableMacro { .. })));
}

#[test]
fn four_by_four_modulo_gates_interfaces_to_disjoint_banks() {
    let plan = plan(1024, 32, &["4w:4r"]);
    assert_eq!(plan.distribution_factor, 4);
    assert!(plan.need_dual_port);
    assert_eq!(plan.duplication_factor, 1);

    let text = emit(1024, 32, &["4w:4r"]);
    // Four writes and four reads, each guarded by its own h-bank subset.
    assert_eq!(text.matches("check_access(").count(), 8);
    for i in 0..4 {
        assert!(text.contains(&format!("if (h % 4 == {i}) begin")));
    }
    assert!(text.contains("bank_CE[0][h][v][hh][0] = mem_CE0;"));
    assert!(text.contains("bank_CE[0][h][v][hh][1] = mem_CE4;"));
}

#[test]
fn planned_factors_satisfy_the_geometry_invariants() {
    let cases: &[(u64, u64, &[&str])] = &[
        (1024, 32, &["1w:1r"]),
        (2048, 32, &["0w:4r"]),
        (1024, 32, &["4ru:0w"]),
        (1024, 32, &["2wu:0r"]),
        (4096, 60, &["4w:4r", "0w:2r"]),
        (8192, 128, &["2w:0r", "0w:8ru"]),
    ];

    for (words, width, tokens) in cases {
        let request = request(*words, *width, tokens);
        let plan = planner::plan(&request, &library()).unwrap();

        assert!(plan.duplication_factor >= 1);
        assert!(plan.distribution_factor >= 1);
        assert!(plan.vbanks >= 1);
        assert!(plan.hhbanks >= 1);

        let banks = plan.duplication_factor * plan.distribution_factor * plan.vbanks * plan.hhbanks;
        assert_eq!(plan.area, banks as f64 * plan.bank_type.area());

        if plan.need_dual_port {
            assert!(plan.bank_type.ports() >= 2);
        }

        assert!(plan.distribution_factor * plan.bank_type.words() * plan.vbanks >= *words);
        assert!(plan.hhbanks * plan.bank_type.width() >= *width);

        for op in request.ops() {
            assert!(plan.read_interfaces >= op.read_count);
            assert!(plan.write_interfaces >= op.write_count);
        }
    }
}

#[test]
fn emitted_module_declares_every_interface_port() {
    let text = emit(2048, 32, &["0w:4r"]);
    let write_interfaces = 1;
    let read_interfaces = 4;
    let inputs = text.lines().filter(|line| line.starts_with("  input ")).count();
    let outputs = text.lines().filter(|line| line.starts_with("  output ")).count();
    assert_eq!(inputs, 1 + 5 * write_interfaces + 2 * read_interfaces);
    assert_eq!(outputs, read_interfaces);
    assert!(text.contains("`timescale 1 ps / 1 ps"));
}

#[test]
fn boundary_geometries_plan_and_emit() {
    for (words, width, token) in [(1, 1, "0w:1r"), (1, 1, "1w:0r"), (1024, 32, "16ru:0w")] {
        let request = request(words, width, &[token]);
        let plan = planner::plan(&request, &library()).unwrap();
        let text = hdl::render_source(&wrapper::build(&request, &plan, true));
        assert!(text.contains("module mem("));
        assert!(text.contains("endmodule"));
    }
}

#[test]
fn sixteen_unknown_reads_duplicate_eightfold() {
    let plan = plan(1024, 32, &["16ru:0w"]);
    assert_eq!(plan.duplication_factor, 8);
    assert_eq!(plan.read_interfaces, 16);
}

#[test]
fn two_unknown_writes_with_a_read_are_rejected() {
    assert!(matches!(
        Operation::parse("2wu:1r", 1024),
        Err(MemgenError::InvalidOperation { .. })
    ));
}

#[test]
fn full_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let tech = dir.path().join("unisim");
    fs::create_dir(&tech).unwrap();
    fs::write(tech.join("lib.txt"), "\
# words width name area ports
1024 32 SRAM_1024x32_1P 1.0 1
1024 32 SRAM_1024x32_2P 1.8 2
1024 32 SRAM_TRIPLE 0.5 3
").unwrap();
    fs::write(dir.path().join("memories.txt"), "\
# name words width ops
fifo 2048 32 0w:4r
scratch 1024 60 1w:1r 2wu:0r
").unwrap();

    // Emitted files land in the working directory.
    std::env::set_current_dir(dir.path()).unwrap();

    let config = Config {
        tech,
        infile: dir.path().join("memories.txt"),
        assertions: true,
    };
    compiler::run(&config).unwrap();

    let first_fifo = fs::read_to_string(dir.path().join("fifo.v")).unwrap();
    let first_scratch = fs::read_to_string(dir.path().join("scratch.v")).unwrap();
    assert!(first_fifo.contains("module fifo("));
    assert!(first_scratch.contains("module scratch("));
    // The three-port macro was skipped, not selected.
    assert!(!first_fifo.contains("SRAM_TRIPLE"));

    compiler::run(&config).unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("fifo.v")).unwrap(), first_fifo);
    assert_eq!(fs::read_to_string(dir.path().join("scratch.v")).unwrap(), first_scratch);
}

#[test]
fn missing_library_reports_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = TechLibrary::load(&dir.path().join("no_such_tech"));
    assert!(matches!(result, Err(MemgenError::Io { .. })));
    let config = Config {
        tech: dir.path().join("no_such_tech"),
        infile: dir.path().join("memories.txt"),
        assertions: true,
    };
    let err = compiler::run(&config).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn malformed_request_line_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("memories.txt"), "broken 1024\n").unwrap();
    let result = memgen::memory::request::read_requests(&dir.path().join("memories.txt"));
    assert!(matches!(result, Err(MemgenError::RequestFormat { .. })));
}
