// This file is the module declaration file for the `builders` module.
// It declares and makes public all the sub-modules within the `src/builders`
// directory. These modules hold the pieces the transform engine is built from.

// `discovery` module:
// Walks the components directory with an explicit stack and keeps the files
// whose extension is on the allow-list.
pub mod discovery;

// `hooks` module:
// Models the host build tool's lifecycle hooks. It defines the `Integration`
// trait, the `HookLogger` that logs every invocation, the integration that
// runs the shuffle at `build:setup`, and the `IntegrationHost` dispatcher.
pub mod hooks;

// `html_patch` module:
// Rewrites rendered pages after the build: adds a class to every heading
// start tag of a matching page and injects markup after `<body>`.
pub mod html_patch;

// `markup` module:
// A small markup scanner that turns component or page text into an element
// tree with byte offsets, so edits can leave everything else untouched.
pub mod markup;

// `patterns` module:
// Locates the container block and its child blocks. It provides the
// `ChildExtractor` trait with a lexical (regex) and a structural (element
// tree) implementation.
pub mod patterns;

// `reporter` module:
// Per-file outcomes, the `TransformReport` of a run, report export, and the
// `ConsoleReporter` the CLI prints with.
pub mod reporter;

// `shuffle` module:
// The Fisher-Yates shuffle applied to child blocks.
pub mod shuffle;

// `validator` module:
// This module is dedicated to ensuring the integrity and correctness of
// the configuration. It defines the `ConfigValidator` trait and a
// `StandardValidator` implementation.
pub mod validator;
