use std::fs;
use std::path::Path;

fn main() {
    let manifest_dir =
        std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let version_file = Path::new(&manifest_dir)
        .ancestors()
        .nth(2)
        .expect("crate lives two levels below the workspace root")
        .join("VERSION");

    println!("cargo:rerun-if-changed={}", version_file.display());

    let raw = fs::read_to_string(&version_file).expect("workspace VERSION file should be readable");
    let version = raw.trim();
    if version.is_empty() {
        panic!("workspace VERSION file is empty");
    }

    println!("cargo:rustc-env=FITFRAME_VERSION={version}");
}
