//! Binding hot paths: slot lookup, cache hits and snapshot save/restore.

use std::hint::black_box;
use std::time::Duration;

use bindery::descriptors::AddressMode;
use bindery::{
    BindingStateConfig, BindingStateManager, HeadlessDevice, NativeHandle, SampledTexture,
    SamplerDesc, UniformBufferRange,
};
use criterion::{Criterion, criterion_group, criterion_main};

fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2))
        .sample_size(30)
}

fn populated_manager() -> BindingStateManager<HeadlessDevice> {
    let mut state =
        BindingStateManager::new(HeadlessDevice::new(), BindingStateConfig::default()).unwrap();
    for handle in 1..=16 {
        state.bind_unique(SampledTexture::new(NativeHandle(handle))).unwrap();
    }
    for block in 0..24 {
        state
            .bind_unique(UniformBufferRange::new(NativeHandle(100), block * 256, 256))
            .unwrap();
    }
    state
}

fn bench_bind_unique_hit(c: &mut Criterion) {
    let mut state = populated_manager();
    c.bench_function("bind_unique_hit_last_texture", |b| {
        b.iter(|| {
            state
                .bind_unique(black_box(SampledTexture::new(NativeHandle(16))))
                .unwrap()
        });
    });
}

fn bench_sampler_cache_hit(c: &mut Criterion) {
    let mut state = populated_manager();
    let descs: Vec<_> = [AddressMode::Repeat, AddressMode::ClampToEdge, AddressMode::MirroredRepeat]
        .into_iter()
        .map(|mode| SamplerDesc::default().with_address_mode(mode))
        .collect();
    for desc in &descs {
        state.get_or_create_sampler(desc).unwrap();
    }
    c.bench_function("sampler_cache_hit", |b| {
        b.iter(|| {
            for desc in &descs {
                black_box(state.get_or_create_sampler(black_box(desc)).unwrap());
            }
        });
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut state = populated_manager();
    let mut buf = vec![0u8; state.snapshot_size()];
    c.bench_function("save_bindings", |b| {
        b.iter(|| state.save_bindings(black_box(&mut buf)).unwrap());
    });
    state.save_bindings(&mut buf).unwrap();
    c.bench_function("restore_bindings", |b| {
        b.iter(|| {
            state.device_mut().take_calls();
            state.restore_bindings(black_box(&buf)).unwrap();
        });
    });
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_bind_unique_hit, bench_sampler_cache_hit, bench_snapshot
}
criterion_main!(benches);
