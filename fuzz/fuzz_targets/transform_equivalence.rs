#![no_main]

use avl_rotate::model::TransformInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: TransformInput| {
    avl_rotate::model::run_transform_equivalence(input);
});
