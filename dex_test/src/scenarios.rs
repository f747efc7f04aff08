mod checksum;
mod load;
mod resolve;

pub unsafe fn run_all() {
    run("checksum-reference", checksum::scenario_checksum_reference);
    run("checksum-edge-files", checksum::scenario_checksum_edge_files);
    run(
        "initialize-missing-runtime",
        resolve::scenario_initialize_missing_runtime,
    );
    run("initialize-art-rejected", resolve::scenario_initialize_art_rejected);
    run(
        "initialize-yunos-rejected",
        resolve::scenario_initialize_yunos_rejected,
    );
    run("direct-load-from-bytes", load::scenario_direct_load_from_bytes);
    run("direct-load-from-path", load::scenario_direct_load_from_path);
    run("direct-load-missing-input", load::scenario_direct_load_missing_input);
    run("opt-dex-file", load::scenario_opt_dex_file);
    run("recover-idempotent", load::scenario_recover_idempotent);
}

unsafe fn run(name: &str, scenario: unsafe fn()) {
    println!("scenario: {name}");
    scenario();
}
