//! Simulated monitoring session
//!
//! Runs the full configure/enable/poll/report loop against the behavioral
//! simulator and prints the decoded telemetry. A healthy signal degrades
//! into bearing wear partway through, so the alarm path fires too.

use senseedge_driver::{
    decode_to_string, CaptureLine, ParameterSet, PipelineController, Reporter, Result,
    SerialTiming, SimBus, UartTx,
};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("senseedge_driver=info")
        .init();

    println!("🔎 SenseEdge Simulated Monitor\n");

    let mut bus = SimBus::with_demo_signal();
    let bearing = [70, 200, 55, 30, 80, 220, 75, 160];
    for _ in 0..3 {
        bus.push_frame(bearing);
    }

    let mut pipeline = PipelineController::new(bus);
    let summary = pipeline.configure(&ParameterSet::diagnostic())?;
    println!(
        "✅ Configured: {} parameters in {:?}\n",
        summary.words_written, summary.elapsed
    );
    pipeline.enable()?;

    let mut reporter = Reporter::new(UartTx::new(CaptureLine::new(), SerialTiming::immediate()));
    reporter.banner();
    let banner = reporter.tx_mut().line_mut().drain();
    print!("{}", decode_to_string(&banner));

    for _ in 0..7 {
        let outcome = pipeline.poll_cycle()?;
        reporter.report(&outcome);

        let levels = reporter.tx_mut().line_mut().drain();
        print!("{}", decode_to_string(&levels));
    }

    let status = pipeline.status();
    println!("\nFinal status: {status:?}");

    let features = pipeline.read_features();
    println!("Last feature frame: {features:?}");

    pipeline.disable();
    println!("\n✅ Monitor demo complete");

    Ok(())
}
