//! Build script for generating Rust code from Protocol Buffers

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    // Only the query clients are needed
    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile(
            &[
                "proto/cosmos/upgrade/v1beta1/query.proto",
                "proto/cosmos/base/node/v1beta1/query.proto",
            ],
            &["proto"],
        )?;

    Ok(())
}
