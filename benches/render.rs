use camino::Utf8PathBuf;
use codechecker_resolver::models::{AnalyzerHandle, Configuration, ConfigurationKey};
use codechecker_resolver::services::{CommandRenderer, RenderInput};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_render(c: &mut Criterion) {
    let analyzer = AnalyzerHandle::new(
        Utf8PathBuf::from("/opt/codechecker/bin/CodeChecker"),
        "6.19.1",
    );
    let mut config = Configuration::defaults();
    config.set(ConfigurationKey::AnalysisOptions, "--analyzers clangsa clang-tidy --ctu");
    let log_file = Utf8PathBuf::from("/work/project/compile_commands.json");

    c.bench_function("render_from_configuration", |b| {
        b.iter(|| {
            let input = RenderInput::from_configuration(black_box(&config), Some(log_file.as_path()));
            CommandRenderer::render(Some(black_box(&analyzer)), &input)
        })
    });

    let input = RenderInput::from_configuration(&config, Some(log_file.as_path()));
    c.bench_function("render_prepared_input", |b| {
        b.iter(|| CommandRenderer::render(Some(black_box(&analyzer)), black_box(&input)))
    });
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
