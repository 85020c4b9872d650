use stress_test::{stress_test_many_documents, stress_test_scaling, stress_test_single_document};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("failed to start runtime: {}", err);
            std::process::exit(1);
        }
    };
    if let Err(err) = rt.block_on(async_main()) {
        tracing::error!(code = err.code(), "stress test failed: {}", err);
        eprintln!("\n✗ Stress test failed: {}", err);
        std::process::exit(1);
    }
}

async fn async_main() -> otter_sdk::Result<()> {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            ASYNC CONVERGENCE STRESS TESTS                  ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: few clients, one document
    let stats = stress_test_single_document(4, 200).await?;
    stats.print();

    // Test 2: many clients, one document
    let stats = stress_test_single_document(16, 500).await?;
    stats.print();

    // Test 3: independent documents in parallel
    let stats = stress_test_many_documents(8, 4, 250).await?;
    stats.print();

    // Test 4: Scaling analysis
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS (single document)                ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_scaling(20, 4).await?;

    println!("\n✓ All stress tests completed successfully!");
    Ok(())
}
