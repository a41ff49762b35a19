// Weft - Flat Record Binding Engine
//
// Copyright (c) 2025 Weft Contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bean factory: constructor selection and dynamic instantiation.
//!
//! Constructor ranking matches each parameter to at most one candidate
//! argument whose runtime type is assignable to the parameter type:
//!
//! - +1 per matched parameter,
//! - −1 per unmatched reference parameter,
//! - −2 per unmatched optional value-type parameter,
//! - −100 per unmatched value-type parameter.
//!
//! The highest score above zero wins; ties go to declaration order; with no
//! positive score the default constructor is used when declared.

use crate::error::{WeftError, WeftResult};
use crate::schema::{ClassDef, ClassRegistry, ConstructorDef, TypeRef};
use crate::value::{Bean, Value};

/// Penalty for an unmatched reference-typed parameter.
const UNMATCHED_REFERENCE: i32 = -1;
/// Penalty for an unmatched nullable value-typed parameter.
const UNMATCHED_OPTIONAL_VALUE: i32 = -2;
/// Penalty for an unmatched value-typed parameter; disqualifying.
const UNMATCHED_VALUE: i32 = -100;

/// Score one constructor against the candidate argument values.
fn score_constructor(
    registry: &ClassRegistry,
    ctor: &ConstructorDef,
    candidates: &[Value],
) -> i32 {
    let mut used = vec![false; candidates.len()];
    let mut score = 0;
    for param in &ctor.params {
        let matched = candidates.iter().enumerate().find(|(i, value)| {
            !used[*i] && registry.value_assignable(&param.ty, value)
        });
        match matched {
            Some((i, _)) => {
                used[i] = true;
                score += 1;
            }
            None if param.ty.is_value_type() && param.optional => {
                score += UNMATCHED_OPTIONAL_VALUE;
            }
            None if param.ty.is_value_type() => score += UNMATCHED_VALUE,
            None => score += UNMATCHED_REFERENCE,
        }
    }
    score
}

/// Select the best-ranked constructor for the candidate argument values.
///
/// Returns the constructor index, or None when no constructor scores above
/// zero and no default constructor is declared.
pub fn best_constructor(
    registry: &ClassRegistry,
    class: &ClassDef,
    candidates: &[Value],
) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (i, ctor) in class.constructors.iter().enumerate() {
        if ctor.params.is_empty() {
            continue;
        }
        let score = score_constructor(registry, ctor, candidates);
        if score > 0 && best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i).or_else(|| {
        class
            .constructors
            .iter()
            .position(|c| c.params.is_empty())
    })
}

/// Select a constructor of exactly `arg_types.len()` parameters whose
/// parameters are positionally assignable from the argument types.
///
/// Used at compile time once constructor-argument bindings are gathered.
/// Fails with a configuration error naming the class when no constructor
/// fits.
pub fn select_for_types(
    registry: &ClassRegistry,
    class: &ClassDef,
    arg_types: &[TypeRef],
) -> WeftResult<usize> {
    for (i, ctor) in class.constructors.iter().enumerate() {
        if ctor.arity() != arg_types.len() {
            continue;
        }
        let fits = ctor
            .params
            .iter()
            .zip(arg_types)
            .all(|(param, arg)| registry.assignable(&param.ty, arg));
        if fits {
            return Ok(i);
        }
    }
    Err(WeftError::config(format!(
        "no constructor of class '{}' accepts {} argument(s) of types ({})",
        class.name,
        arg_types.len(),
        arg_types
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

/// Instantiate a bean through the given constructor.
///
/// Arguments are positional; each is stored under its parameter name.
/// Parameters without an argument receive the neutral default (null).
pub fn instantiate(
    class: &ClassDef,
    ctor_index: Option<usize>,
    args: Vec<Value>,
) -> WeftResult<Bean> {
    let mut bean = Bean::new(class.name.clone());
    let Some(index) = ctor_index else {
        return Ok(bean);
    };
    let ctor = class.constructors.get(index).ok_or_else(|| {
        WeftError::config(format!(
            "class '{}' has no constructor at index {}",
            class.name, index
        ))
    })?;
    let mut args = args.into_iter();
    for param in &ctor.params {
        let value = args.next().unwrap_or(Value::Null);
        bean.set(param.name.clone(), value);
    }
    Ok(bean)
}
