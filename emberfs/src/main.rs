use emberfs::vfs::demo::e2e_volume_demo;

fn main() {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("demo") => {
            let dir = match args.next() {
                Some(p) => p,
                None => {
                    eprintln!("Usage: emberfs demo <dir>");
                    std::process::exit(2);
                }
            };
            match e2e_volume_demo(&dir) {
                Ok(()) => println!("demo: OK"),
                Err(e) => {
                    eprintln!("demo failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        _ => {
            println!("emberfs — embedded-style volume over a host directory\nUsage:\n  emberfs demo <dir>");
        }
    }
}
