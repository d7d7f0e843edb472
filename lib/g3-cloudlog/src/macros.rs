/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

macro_rules! impl_severity_methods {
    ($($m:tt)?) => {
        pub fn debug<T: Into<String>>(&$($m)? self, payload: T) {
            self.emit(payload, Severity::Debug)
        }

        pub fn debug_fmt(&$($m)? self, args: std::fmt::Arguments<'_>) {
            self.debug(args.to_string())
        }

        pub fn info<T: Into<String>>(&$($m)? self, payload: T) {
            self.emit(payload, Severity::Info)
        }

        pub fn info_fmt(&$($m)? self, args: std::fmt::Arguments<'_>) {
            self.info(args.to_string())
        }

        pub fn warning<T: Into<String>>(&$($m)? self, payload: T) {
            self.emit(payload, Severity::Warning)
        }

        pub fn warning_fmt(&$($m)? self, args: std::fmt::Arguments<'_>) {
            self.warning(args.to_string())
        }

        pub fn error<T: Into<String>>(&$($m)? self, payload: T) {
            self.emit(payload, Severity::Error)
        }

        pub fn error_fmt(&$($m)? self, args: std::fmt::Arguments<'_>) {
            self.error(args.to_string())
        }

        pub fn critical<T: Into<String>>(&$($m)? self, payload: T) {
            self.emit(payload, Severity::Critical)
        }

        pub fn critical_fmt(&$($m)? self, args: std::fmt::Arguments<'_>) {
            self.critical(args.to_string())
        }

        pub fn alert<T: Into<String>>(&$($m)? self, payload: T) {
            self.emit(payload, Severity::Alert)
        }

        pub fn alert_fmt(&$($m)? self, args: std::fmt::Arguments<'_>) {
            self.alert(args.to_string())
        }

        pub fn emergency<T: Into<String>>(&$($m)? self, payload: T) {
            self.emit(payload, Severity::Emergency)
        }

        pub fn emergency_fmt(&$($m)? self, args: std::fmt::Arguments<'_>) {
            self.emergency(args.to_string())
        }
    };
}
