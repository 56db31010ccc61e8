use orbitals::{EngineConfig, NodalSurfaces, Request, Response, WorkerHandle};
use serde::Serialize;

#[derive(Serialize)]
struct Summary {
    n: u32,
    l: u32,
    m: i32,
    z: u32,
    count: usize,
    pool_size: usize,
    extent: f64,
    max_probability: f64,
    nodal: NodalSurfaces,
}

fn arg<T: std::str::FromStr>(args: &[String], index: usize, default: T) -> T {
    args.get(index)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    // usage: orbitals [n] [l] [m] [z] [count]
    let args: Vec<String> = std::env::args().collect();
    let n = arg(&args, 1, 2u32);
    let l = arg(&args, 2, 1u32);
    let m = arg(&args, 3, 0i32);
    let z = arg(&args, 4, 1u32);
    let count = arg(&args, 5, 20_000usize);

    println!("Sampling orbital ({n}, {l}, {m}) for Z={z} with {count} particles...");

    let worker = WorkerHandle::spawn(EngineConfig::default());
    let envelope = match worker
        .request(Request::Sample {
            z,
            n,
            l,
            m,
            count,
            is_dark: true,
        })
        .await
    {
        Ok(envelope) => envelope,
        Err(message) => {
            eprintln!("request failed: {message}");
            std::process::exit(1);
        }
    };

    match envelope.response {
        Response::Sample(result) => {
            let summary = Summary {
                n,
                l,
                m,
                z,
                count: result.positions.len(),
                pool_size: result.all_valid_positions.len(),
                extent: result.extent,
                max_probability: result.max_probability,
                nodal: result.nodal,
            };
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("serialize summary: {e}"),
            }
        }
        Response::SampleError { message } => {
            eprintln!("sampling failed: {message}");
            std::process::exit(1);
        }
        other => {
            eprintln!("unexpected response: {other:?}");
            std::process::exit(1);
        }
    }

    worker.terminate();
}
