use glitchrig_campaign::{ClassifierKind, StrategyKind};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("glitchrig {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: glitchrig");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("GLITCHRIG_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("features: serial={}, cli=true", cfg!(feature = "serial"));
    println!("strategies: {}", names(StrategyKind::ALL.map(|k| (k.name(), k.is_implemented()))));
    println!(
        "classifiers: {}",
        names([ClassifierKind::Rules, ClassifierKind::Ml].map(|k| (k.name(), k.is_implemented())))
    );

    Ok(SUCCESS)
}

fn names<const N: usize>(kinds: [(&str, bool); N]) -> String {
    kinds
        .iter()
        .map(|&(name, implemented)| {
            if implemented {
                name.to_string()
            } else {
                format!("{name} (unsupported)")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
