#![no_main]
use activity_tree_core::codec::binary::{self, MAGIC};
use activity_tree_core::ValidationLimits;
use libfuzzer_sys::fuzz_target;

// The digest stops almost every random input at the door; seal the input
// with a valid magic, version and digest so the structural checks get fuzzed

fuzz_target!(|data: &[u8]| {
    let mut bytes = Vec::with_capacity(data.len() + 38);
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(data);
    let digest = blake3::hash(&bytes);
    bytes.extend_from_slice(digest.as_bytes());

    if let Ok(model) = binary::decode(&bytes, &ValidationLimits::default()) {
        let encoded = binary::encode(&model, &Default::default());
        let again = binary::decode(&encoded, &ValidationLimits::default())
            .expect("re-encoded model decodes");
        assert_eq!(again, model);

        let features = vec![1.0f32; model.num_features()];
        assert!(model.classify(&features).is_ok());
    }
});
