// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! Turn-based chess sessions.
//!
//! [`board`] is the rules engine, [`game`] tracks one game from its first
//! move to its result, and [`session`] keeps many games apart and decides
//! who may move in each.

pub mod board;
pub mod game;
pub mod session;

pub use board::*;
pub use game::*;
pub use session::*;
