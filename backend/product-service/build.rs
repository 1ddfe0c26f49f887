fn main() -> Result<(), Box<dyn std::error::Error>> {
    let services_dir = "../proto/services";

    println!("cargo:rerun-if-changed={}/product_service.proto", services_dir);

    tonic_build::configure().compile_protos(
        &[format!("{services_dir}/product_service.proto")],
        &[services_dir],
    )?;

    Ok(())
}
