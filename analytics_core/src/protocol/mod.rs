/*!
 * Protocol layer: data structures, constants, and credential handling.
 *
 * Everything related to *what* we send to the ingestion API:
 * - `types`: the `Event` record and the `BatchPayload` envelope
 * - `constants`: defaults, success status, library identity
 * - `credential`: write key validation and Basic auth encoding
 */

pub mod constants;
pub mod credential;
pub mod types;
