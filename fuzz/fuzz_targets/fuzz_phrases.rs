#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(set) = perch_config::PhraseSet::from_json(data) {
        let keys: Vec<String> = set.keys().map(str::to_owned).collect();
        for key in keys {
            let _ = set.phrases(&key);
        }
    }
});
