use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("m8link {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: m8link");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", env!("M8LINK_BUILD_TARGET"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "features: async={}, cli=true",
        cfg!(feature = "async")
    );
    println!(
        "default_device: {}",
        m8link_transport::SerialDevice::DEFAULT_PATH
    );
    println!(
        "screen: {}x{}",
        m8link_command::SCREEN_WIDTH,
        m8link_command::SCREEN_HEIGHT
    );

    Ok(SUCCESS)
}
