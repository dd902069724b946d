use anyhow::Result;

use crate::cli::PathArgs;
use hashstamp::hashing::PathPolicy;
use hashstamp::utils::format_hash;

pub fn run(paths: Vec<String>, options: PathArgs) -> Result<()> {
    let policy = match options.case_sensitive {
        Some(case_sensitive) => PathPolicy::new(options.portable, case_sensitive),
        None => PathPolicy::for_host(options.portable),
    };

    tracing::debug!("Path policy: {:?}", policy);

    for path in &paths {
        println!("{}  {}", format_hash(policy.fingerprint(path)), path);
    }

    Ok(())
}
