//! Validates each raw record and rebases its virtual addresses against the summary's image base
//! before any address-overlap join can use them.

use crate::raw::{RawCall, RawFunctionRecord};
use crate::report::{CallRecord, CfgBlock, DecompFunction, DecompVariable};
use crate::storage::storage_key;
use crate::warnings::{cfg_completeness, function_verdict, DecompileWarning};

fn rebase(va: u64, image_base: u64) -> u64 {
    va.wrapping_sub(image_base)
}

fn reshape_call(call: &RawCall, caller_entry_va: u64, image_base: u64) -> CallRecord {
    CallRecord {
        caller_entry_va,
        callsite_va: rebase(call.callsite_va, image_base),
        kind: call.kind,
        callee_va: call.callee_va.map(|va| rebase(va, image_base)),
        callee_name: call.callee_name.clone(),
    }
}

/// Reshapes one raw function record, rebasing every virtual address by `image_base`.
pub fn reshape_function(raw: &RawFunctionRecord, image_base: u64) -> DecompFunction {
    let entry_va = rebase(raw.entry_va, image_base);
    let body_start_va = raw.body_start_va.map(|va| rebase(va, image_base));
    let body_end_va = raw.body_end_va.map(|va| rebase(va, image_base));
    let has_body = body_start_va.is_some() && body_end_va.is_some();

    let warnings: Vec<DecompileWarning> = raw
        .warnings
        .iter()
        .map(|w| DecompileWarning::parse(w))
        .collect();

    let variables = raw
        .variables
        .iter()
        .map(|v| DecompVariable {
            storage_key: storage_key(v),
            name: v.name.clone(),
            type_string: v.type_string.clone(),
            access_sites: v.access_sites.iter().map(|va| rebase(*va, image_base)).collect(),
        })
        .collect();

    let blocks = raw
        .blocks
        .iter()
        .map(|b| CfgBlock {
            start_va: rebase(b.start_va, image_base),
            end_va: rebase(b.end_va, image_base),
            successors: b.successors.iter().map(|va| rebase(*va, image_base)).collect(),
        })
        .collect();

    let calls = raw
        .calls
        .iter()
        .map(|c| reshape_call(c, entry_va, image_base))
        .collect();

    DecompFunction {
        entry_va,
        body_start_va,
        body_end_va,
        instruction_count: raw.instruction_count,
        decompiled_text: raw.decompiled_text.clone(),
        name: raw.name.clone(),
        is_thunk: raw.is_thunk,
        is_external: raw.is_external,
        verdict: function_verdict(&warnings, has_body),
        cfg_completeness: cfg_completeness(&warnings),
        variables,
        blocks,
        calls,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawCallKind, RawStorageClass, RawVariable};

    fn minimal_record() -> RawFunctionRecord {
        RawFunctionRecord {
            entry_va: 0x401000,
            body_start_va: Some(0x401000),
            body_end_va: Some(0x401020),
            instruction_count: Some(10),
            decompiled_text: Some("void f(void) {}".to_string()),
            variables: vec![RawVariable {
                name: Some("x".to_string()),
                storage_class: RawStorageClass::Register,
                storage_detail: Some("rdi".to_string()),
                type_string: Some("int".to_string()),
                access_sites: vec![0x401004],
            }],
            blocks: Vec::new(),
            calls: vec![RawCall {
                callsite_va: 0x401010,
                kind: RawCallKind::Direct,
                callee_va: Some(0x402000),
                callee_name: Some("g".to_string()),
            }],
            warnings: Vec::new(),
            is_thunk: false,
            is_external: false,
            name: Some("f".to_string()),
        }
    }

    #[test]
    fn addresses_are_rebased_by_image_base() {
        let record = minimal_record();
        let function = reshape_function(&record, 0x400000);
        assert_eq!(function.entry_va, 0x1000);
        assert_eq!(function.body_start_va, Some(0x1000));
        assert_eq!(function.calls[0].callsite_va, 0x10);
        assert_eq!(function.calls[0].callee_va, Some(0x2000));
    }

    #[test]
    fn function_with_body_and_no_warnings_is_accepted() {
        let function = reshape_function(&minimal_record(), 0);
        assert_eq!(function.verdict, reforge_common::Verdict::Accept);
    }

    #[test]
    fn missing_body_is_rejected() {
        let mut record = minimal_record();
        record.body_start_va = None;
        let function = reshape_function(&record, 0);
        assert_eq!(function.verdict, reforge_common::Verdict::Reject);
    }
}
