/*!
 * Monitoring
 * Tracing setup for binaries embedding the scheduler
 */

mod tracer;

pub use tracer::init_tracing;
