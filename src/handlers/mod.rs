// handlers/mod.rs - Two-Tier Handler Architecture
//
// Public (no auth) → Protected (staff JWT auth)
//
pub mod protected; // Tier 2: Staff JWT required (/api/*)
pub mod public; // Tier 1: No authentication required (/, /health, /auth/*)

/*
HANDLER LAYOUT:

src/handlers/
├── mod.rs                  ← This file
├── public/
│   ├── mod.rs              ← GET / and GET /health
│   └── auth.rs             ← POST /auth/login
└── protected/
    ├── mod.rs              ← shared extractors (rider id path parsing)
    ├── auth.rs             ← GET /api/auth/whoami, POST /api/auth/logout
    ├── enrollment/         ← the four wizard step actions
    │   ├── personal.rs     ← POST /api/enrollment/personal
    │   ├── security.rs     ← POST /api/enrollment/:rider_id/security
    │   ├── documents.rs    ← POST /api/enrollment/:rider_id/documents (multipart)
    │   └── finance.rs      ← POST /api/enrollment/:rider_id/finance
    ├── riders.rs           ← rider read model + edit path
    └── audit.rs            ← GET /api/audit-logs

Handlers stay thin: extract, call a service, wrap the result in the
success envelope. Every failure is an ApiError, which renders the failure
envelope with the right status code.
*/
