/*!

A "logger" that writes nothing but keeps the public API of the `log` module intact when the
`logging` feature is disabled.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Sets the global maximum level; there is no logger to configure.
    pub(in crate::log) fn set_config(&mut self) {
        let max_level = self
            .module_levels
            .values()
            .copied()
            .fold(self.global_log_level, std::cmp::max);
        log::set_max_level(max_level);
    }
}
