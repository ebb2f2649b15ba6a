use std::env;
use std::fs;
use std::path::Path;

// Copies data/ (the bundled algorithms.toml) next to the built binary, where
// the CLI looks for its default config.
fn main() {
    println!("cargo:rerun-if-changed=data/");

    let source = Path::new("data");
    if !source.exists() {
        return;
    }

    let out_dir = env::var("OUT_DIR").unwrap();
    let Some(target_dir) = Path::new(&out_dir).ancestors().nth(3) else {
        return;
    };
    let destination = target_dir.join("data");

    fs::create_dir_all(&destination).unwrap();
    for entry in fs::read_dir(source).unwrap().flatten() {
        let path = entry.path();
        if let (true, Some(name)) = (path.is_file(), path.file_name()) {
            fs::copy(&path, destination.join(name)).unwrap();
        }
    }
}
