//! Wraps a submission with the epilogue that calls `main()` and reports back.

use scriptbox_sandbox::ScriptJob;

use crate::protocol::FrameMarkers;

/// Python appended to every submission.
///
/// Contract with the decoder: exit 0 after a success frame, exit 1 after an
/// error frame, at most one frame per run.
const EPILOGUE: &str = r#"


def __scriptbox_entry():
    import inspect as _inspect
    import io as _io
    import json as _json
    import sys as _sys
    import traceback as _traceback

    _real_stdout = _sys.stdout

    def _emit(start, payload, end):
        _real_stdout.write(start + payload + end + "\n")
        _real_stdout.flush()

    def _fail(kind, message):
        _emit(
            "@ERROR_START@",
            _json.dumps({"kind": kind, "message": message}),
            "@ERROR_END@",
        )
        _sys.exit(1)

    _main = globals().get("main")
    if not callable(_main):
        _fail("signature", "main is not callable")
    try:
        _inspect.signature(_main).bind()
    except TypeError:
        _fail("signature", "main() must be callable without arguments")
    except ValueError:
        pass

    _captured = _io.StringIO()
    _sys.stdout = _captured
    try:
        _result = _main()
    except Exception as _exc:
        _sys.stdout = _real_stdout
        _traceback.print_exc()
        _fail("exception", str(_exc) or type(_exc).__name__)
    finally:
        _sys.stdout = _real_stdout

    try:
        _payload = _json.dumps(
            {"main_result": _result, "stdout": _captured.getvalue()},
            allow_nan=False,
        )
    except (TypeError, ValueError) as _exc:
        _fail("unserializable", "main() must return JSON-serializable data: " + str(_exc))

    _emit("@RESULT_START@", _payload, "@RESULT_END@")


__scriptbox_entry()
"#;

/// A submission plus its epilogue, ready to run.
#[derive(Debug, Clone)]
pub struct HarnessedScript {
    source: String,
    markers: FrameMarkers,
}

impl HarnessedScript {
    /// Full source handed to the interpreter.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Markers this script's frames are written with.
    pub fn markers(&self) -> &FrameMarkers {
        &self.markers
    }

    /// Describe this script as a sandbox job.
    ///
    /// Either frame's start marker proves the script ran to completion.
    pub fn to_job(&self) -> ScriptJob {
        ScriptJob::new(self.source.clone())
            .with_completion_marker(self.markers.result_start())
            .with_completion_marker(self.markers.error_start())
    }
}

/// Builds [`HarnessedScript`]s.
#[derive(Debug, Clone, Default)]
pub struct HarnessBuilder;

impl HarnessBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Wrap a validated script, with fresh markers.
    pub fn build(&self, script: &str) -> HarnessedScript {
        self.build_with_markers(script, FrameMarkers::generate())
    }

    /// Wrap a validated script with the given markers.
    pub fn build_with_markers(&self, script: &str, markers: FrameMarkers) -> HarnessedScript {
        let epilogue = EPILOGUE
            .replace("@RESULT_START@", markers.result_start())
            .replace("@RESULT_END@", markers.result_end())
            .replace("@ERROR_START@", markers.error_start())
            .replace("@ERROR_END@", markers.error_end());

        let mut source = String::with_capacity(script.len() + epilogue.len());
        source.push_str(script);
        source.push_str(&epilogue);

        HarnessedScript { source, markers }
    }
}
