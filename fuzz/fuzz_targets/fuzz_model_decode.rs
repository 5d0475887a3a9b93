#![no_main]
use activity_tree_core::storage::decode_any;
use activity_tree_core::ValidationLimits;
use libfuzzer_sys::fuzz_target;

// Raw artifacts in either encoding: decode must reject or return a model
// that classifies without panicking

fuzz_target!(|data: &[u8]| {
    if let Ok(model) = decode_any(data, &ValidationLimits::default()) {
        let features = vec![0.0f32; model.num_features()];
        let class = model.classify(&features).expect("validated model classifies");
        assert!(class < model.num_classes());
    }
});
