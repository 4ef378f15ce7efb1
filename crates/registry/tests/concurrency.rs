use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use arbor_registry::{LanguageMetadata, LanguageRegistry};

const THREADS: usize = 8;

#[test]
fn racing_first_access_instantiates_once() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();

	let mut builder = LanguageRegistry::builder("race");
	builder.provider(LanguageMetadata::new("cs"), move || {
		counter.fetch_add(1, Ordering::SeqCst);
		thread::sleep(Duration::from_millis(20));
		vec![1u8, 2, 3]
	});
	let registry = builder.build();
	let barrier = Barrier::new(THREADS);

	let addresses: Vec<usize> = thread::scope(|scope| {
		let handles: Vec<_> = (0..THREADS)
			.map(|i| {
				let registry = &registry;
				let barrier = &barrier;
				scope.spawn(move || {
					barrier.wait();
					let value = match i % 3 {
						0 => registry.exact_language("cs").map(|p| p.value()),
						1 => registry.filter_language("cs").next(),
						_ => registry.group_by_single_language()["cs"].first().map(|p| p.value()),
					};
					value.map(|v| v as *const Vec<u8> as usize).unwrap_or_default()
				})
			})
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert!(addresses[0] != 0);
	assert!(addresses.iter().all(|&a| a == addresses[0]));
}

#[test]
fn registries_are_independent() {
	let build = || {
		let mut builder = LanguageRegistry::builder("independent");
		builder.provider(LanguageMetadata::new("cs"), String::new);
		builder.build()
	};
	let first = build();
	let second = build();

	assert!(first.exact_language("cs").is_some_and(|p| p.value().is_empty()));
	assert!(second.exact_language("cs").is_some_and(|p| !p.is_instantiated()));
}
