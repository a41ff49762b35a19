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

//! The two-pass configuration compiler.
//!
//! Pass one ([`preprocess`]) validates and defaults the declarative tree.
//! Pass two (the parser factory) lowers it into the executable parser and
//! property trees in lockstep.

mod factory;
mod preprocess;

pub use preprocess::preprocess;

use crate::config::StreamConfig;
use crate::error::WeftResult;
use crate::schema::ClassRegistry;
use crate::stream::Stream;
use crate::types::TypeHandlerRegistry;
use std::sync::Arc;

/// Compile a stream configuration into an immutable [`Stream`].
pub(crate) fn compile(
    mut config: StreamConfig,
    classes: Arc<ClassRegistry>,
    handlers: &TypeHandlerRegistry,
) -> WeftResult<Stream> {
    preprocess(&mut config, &classes, handlers)?;
    factory::build(&config, classes, handlers)
}
