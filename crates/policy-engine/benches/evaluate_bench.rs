use criterion::{black_box, criterion_group, criterion_main, Criterion};
use policy_core::{PolicyCategory, PolicyConfiguration};
use rust_decimal::Decimal;

fn sweep_configs() -> Vec<PolicyConfiguration> {
    let mut configs = Vec::with_capacity(31);
    for step in 0..=30i64 {
        let mut cfg = PolicyConfiguration {
            biofuels_enabled: step % 2 == 0,
            congestion_charge: (step % 21) as u32,
            bev_grant_per_vehicle: (step as u32) * 300,
            ..Default::default()
        };
        for c in PolicyCategory::ALL {
            cfg.allocations.set(c, Decimal::new(step * 10, 0));
        }
        configs.push(cfg);
    }
    configs
}

fn bench_evaluate(c: &mut Criterion) {
    let baseline = PolicyConfiguration::default();
    c.bench_function("evaluate baseline", |b| {
        b.iter(|| black_box(policy_engine::evaluate(black_box(&baseline))))
    });

    let configs = sweep_configs();
    c.bench_function("evaluate slider sweep x31", |b| {
        b.iter(|| {
            for cfg in &configs {
                black_box(policy_engine::evaluate(cfg));
            }
        })
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
