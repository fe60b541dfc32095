//! The built-in LSL function catalogue, plus the table of user-defined
//! function signatures discovered as the parser walks the source.
//!
//! Every built-in maps to one [`TargetForm`] telling [`crate::codegen`]
//! how to lower a call to `llFoo(...)` into TSL.

use crate::ast::Type;
use rustc_hash::FxHashMap;

/// Where a built-in call lowers to in generated TSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetForm {
    /// `this.world.<method>(...)`, awaited.
    World,
    /// `this.object.<method>(...)`, awaited.
    Object,
    /// `this.container.<method>(...)`, awaited.
    Container,
    /// An inline expression template, not awaited (e.g. `llGetPos` has no
    /// args and maps straight to `this.object.getPosition()`).
    Inline,
}

/// A built-in function's signature and codegen target.
#[derive(Debug, Clone)]
pub struct BuiltinSignature {
    pub param_types: Vec<Type>,
    pub return_ty: Type,
    pub target: TargetForm,
    /// The TSL-side method name (namespace member, or the inline template name).
    pub tsl_name: &'static str,
}

/// A user-defined function's signature, recorded on first sight.
#[derive(Debug, Clone)]
pub struct UserSignature {
    pub param_types: Vec<Type>,
    pub return_ty: Type,
}

/// Resolves `llFoo`-style calls against the built-in catalogue, and tracks
/// user functions discovered while parsing so later calls to them can be
/// type-checked without a forward-declaration requirement.
#[derive(Debug)]
pub struct FunctionResolver {
    builtins: FxHashMap<&'static str, BuiltinSignature>,
    user_functions: FxHashMap<String, UserSignature>,
}

impl Default for FunctionResolver {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! sig {
    ($map:expr, $name:expr, [$($p:expr),*], $ret:expr, $target:expr, $tsl:expr) => {
        $map.insert(
            $name,
            BuiltinSignature {
                param_types: vec![$($p),*],
                return_ty: $ret,
                target: $target,
                tsl_name: $tsl,
            },
        );
    };
}

impl FunctionResolver {
    /// Builds a resolver pre-populated with the built-in catalogue.
    pub fn new() -> Self {
        use Type::*;
        let mut builtins = FxHashMap::default();

        // Chat / communication -> world
        sig!(builtins, "llSay", [Integer, String], Void, TargetForm::World, "say");
        sig!(builtins, "llWhisper", [Integer, String], Void, TargetForm::World, "whisper");
        sig!(builtins, "llShout", [Integer, String], Void, TargetForm::World, "shout");
        sig!(builtins, "llRegionSay", [Integer, String], Void, TargetForm::World, "regionSay");
        sig!(builtins, "llInstantMessage", [Key, String], Void, TargetForm::World, "instantMessage");
        sig!(builtins, "llDialog", [Key, String, List, Integer], Void, TargetForm::World, "dialog");
        sig!(builtins, "llListen", [Integer, String, Key, String], Integer, TargetForm::World, "listen");
        sig!(builtins, "llListenRemove", [Integer], Void, TargetForm::World, "listenRemove");
        sig!(builtins, "llListenControl", [Integer, Integer], Void, TargetForm::World, "listenControl");

        // Timers -> world
        sig!(builtins, "llSetTimerEvent", [Float], Void, TargetForm::World, "setTimer");
        sig!(builtins, "llResetTime", [], Void, TargetForm::World, "resetTime");

        // Script control -> world
        sig!(builtins, "llResetScript", [], Void, TargetForm::World, "resetScript");
        sig!(builtins, "llSleep", [Float], Void, TargetForm::World, "sleep");

        // HTTP -> world
        sig!(builtins, "llHTTPRequest", [String, List, String], Key, TargetForm::World, "httpRequest");

        // Sensors -> world
        sig!(builtins, "llSensor", [String, Key, Integer, Float, Float], Void, TargetForm::World, "sensor");
        sig!(builtins, "llSensorRepeat", [String, Key, Integer, Float, Float, Float], Void, TargetForm::World, "sensorRepeat");
        sig!(builtins, "llSensorRemove", [], Void, TargetForm::World, "sensorRemove");

        // Permissions -> world
        sig!(builtins, "llRequestPermissions", [Key, Integer], Void, TargetForm::World, "requestPermissions");

        // Transform / appearance -> object
        sig!(builtins, "llSetPos", [Vector], Void, TargetForm::Object, "setPosition");
        sig!(builtins, "llGetPos", [], Vector, TargetForm::Inline, "getPosition");
        sig!(builtins, "llSetRot", [Rotation], Void, TargetForm::Object, "setRotation");
        sig!(builtins, "llGetRot", [], Rotation, TargetForm::Inline, "getRotation");
        sig!(builtins, "llSetScale", [Vector], Void, TargetForm::Object, "setScale");
        sig!(builtins, "llGetScale", [], Vector, TargetForm::Inline, "getScale");
        sig!(builtins, "llSetColor", [Vector, Integer], Void, TargetForm::Object, "setColor");
        sig!(builtins, "llSetAlpha", [Float, Integer], Void, TargetForm::Object, "setAlpha");
        sig!(builtins, "llSetTexture", [String, Integer], Void, TargetForm::Object, "setTexture");
        sig!(builtins, "llSetText", [String, Vector, Float], Void, TargetForm::Object, "setText");
        sig!(builtins, "llSetLinkAlpha", [Integer, Float, Integer], Void, TargetForm::Object, "setLinkAlpha");

        // Effects -> object
        sig!(builtins, "llPlaySound", [String, Float], Void, TargetForm::Object, "playSound");
        sig!(builtins, "llLoopSound", [String, Float], Void, TargetForm::Object, "loopSound");
        sig!(builtins, "llStopSound", [], Void, TargetForm::Object, "stopSound");
        sig!(builtins, "llParticleSystem", [List], Void, TargetForm::Object, "setParticles");

        // Animation -> object
        sig!(builtins, "llStartAnimation", [String], Void, TargetForm::Object, "playAnimation");
        sig!(builtins, "llStopAnimation", [String], Void, TargetForm::Object, "stopAnimation");

        // Physics -> object
        sig!(builtins, "llApplyImpulse", [Vector, Integer], Void, TargetForm::Object, "applyImpulse");
        sig!(builtins, "llApplyRotationalImpulse", [Vector, Integer], Void, TargetForm::Object, "applyTorqueImpulse");
        sig!(builtins, "llSetForce", [Vector, Integer], Void, TargetForm::Object, "setForce");
        sig!(builtins, "llSetStatus", [Integer, Integer], Void, TargetForm::Object, "setPhysics");

        // Inventory / link-message -> container
        sig!(builtins, "llMessageLinked", [Integer, Integer, String, Key], Void, TargetForm::Container, "sendLinkMessage");
        sig!(builtins, "llGetLinkNumber", [], Integer, TargetForm::Inline, "getLinkNumber");
        sig!(builtins, "llGetInventoryName", [Integer, Integer], String, TargetForm::Container, "getInventoryName");
        sig!(builtins, "llGetNumberOfPrims", [], Integer, TargetForm::Inline, "getNumberOfPrims");

        // Math / pure inline helpers
        sig!(builtins, "llFabs", [Float], Float, TargetForm::Inline, "Math.abs");
        sig!(builtins, "llSqrt", [Float], Float, TargetForm::Inline, "Math.sqrt");
        sig!(builtins, "llPow", [Float, Float], Float, TargetForm::Inline, "Math.pow");
        sig!(builtins, "llFrand", [Float], Float, TargetForm::Inline, "Math.random");
        sig!(builtins, "llRound", [Float], Integer, TargetForm::Inline, "Math.round");
        sig!(builtins, "llFloor", [Float], Integer, TargetForm::Inline, "Math.floor");
        sig!(builtins, "llCeil", [Float], Integer, TargetForm::Inline, "Math.ceil");
        sig!(builtins, "llVecMag", [Vector], Float, TargetForm::Inline, "vecMag");
        sig!(builtins, "llVecNorm", [Vector], Vector, TargetForm::Inline, "vecNorm");
        sig!(builtins, "llVecDist", [Vector, Vector], Float, TargetForm::Inline, "vecDist");

        // String / list helpers (pure, inline)
        sig!(builtins, "llStringLength", [String], Integer, TargetForm::Inline, "length");
        sig!(builtins, "llGetSubString", [String, Integer, Integer], String, TargetForm::Inline, "substring");
        sig!(builtins, "llToUpper", [String], String, TargetForm::Inline, "toUpperCase");
        sig!(builtins, "llToLower", [String], String, TargetForm::Inline, "toLowerCase");
        sig!(builtins, "llGetListLength", [List], Integer, TargetForm::Inline, "length");
        sig!(builtins, "llList2String", [List, Integer], String, TargetForm::Inline, "list2String");
        sig!(builtins, "llList2Integer", [List, Integer], Integer, TargetForm::Inline, "list2Integer");
        sig!(builtins, "llList2Float", [List, Integer], Float, TargetForm::Inline, "list2Float");
        sig!(builtins, "llDumpList2String", [List, String], String, TargetForm::Inline, "join");

        // NPC -> object
        sig!(builtins, "osNpcCreate", [String, String, Vector, Key], Key, TargetForm::Object, "npcCreate");
        sig!(builtins, "osNpcRemove", [Key], Void, TargetForm::Object, "npcRemove");
        sig!(builtins, "osNpcMoveTo", [Key, Vector], Void, TargetForm::Object, "npcMoveTo");
        sig!(builtins, "osNpcSay", [Key, String], Void, TargetForm::Object, "npcSay");

        Self {
            builtins,
            user_functions: FxHashMap::default(),
        }
    }

    /// Looks up a built-in signature by its LSL name (`llSay`, `osNpcCreate`, ...).
    pub fn resolve_builtin(&self, name: &str) -> Option<&BuiltinSignature> {
        self.builtins.get(name)
    }

    /// Records a user-defined function's signature, discovered on first sight.
    pub fn declare_user_function(&mut self, name: &str, param_types: Vec<Type>, return_ty: Type) {
        self.user_functions.insert(name.to_string(), UserSignature { param_types, return_ty });
    }

    /// Looks up a previously-declared user function.
    pub fn resolve_user(&self, name: &str) -> Option<&UserSignature> {
        self.user_functions.get(name)
    }

    /// `true` if `name` is a known built-in.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_say_to_world_target() {
        let r = FunctionResolver::new();
        let sig = r.resolve_builtin("llSay").expect("llSay is a built-in");
        assert_eq!(sig.target, TargetForm::World);
        assert_eq!(sig.tsl_name, "say");
    }

    #[test]
    fn user_functions_round_trip() {
        let mut r = FunctionResolver::new();
        r.declare_user_function("addOne", vec![Type::Integer], Type::Integer);
        let sig = r.resolve_user("addOne").unwrap();
        assert_eq!(sig.return_ty, Type::Integer);
    }
}
