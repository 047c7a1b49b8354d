//! Annotated plot of a single case.

use std::path::PathBuf;

use scopetrace_common::config::AppConfig;
use scopetrace_render_engine::report::annotate_case;

pub fn run(config: &AppConfig, path: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let landmarks = annotate_case(&path, &output, &config.labels, &config.plots)?;
    let (cecum, flexure_left, flexure_right, end, start) = landmarks.as_tuple();
    println!("Annotated {} -> {}", path.display(), output.display());
    println!(
        "  Start {start}, Flexure L {flexure_left}, Flexure R {flexure_right}, Cecum {cecum}, End {end}"
    );
    Ok(())
}
