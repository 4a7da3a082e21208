use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use n64_app::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

const INIT_SLOT: &str = "onRuntimeInitialized";
const CREATE_DATA_FILE: &str = "FS_createDataFile";
const UNLINK: &str = "FS_unlink";

/// The emscripten module as published on the global object, looked up on
/// every probe because its loader script may run after ours
pub struct JsModuleSurface {
    global: Object,
    module_name: String,
}

impl JsModuleSurface {
    pub fn new(global: Object, module_name: &str) -> Self {
        Self {
            global,
            module_name: module_name.to_owned(),
        }
    }

    fn module(&self) -> Option<Object> {
        let value = Reflect::get(&self.global, &JsValue::from_str(&self.module_name)).ok()?;
        value.dyn_into::<Object>().ok()
    }

    fn target(&self, scope: Scope) -> Option<Object> {
        match scope {
            Scope::Module => self.module(),
            Scope::Page => Some(self.global.clone()),
        }
    }

    fn function(&self, scope: Scope, name: &str) -> Option<JsFunction> {
        let this = self.target(scope)?;
        let function = Reflect::get(&this, &JsValue::from_str(name))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some(JsFunction {
            this: this.into(),
            function,
        })
    }
}

pub struct JsFunction {
    this: JsValue,
    function: Function,
}

impl EntryPoint for JsFunction {
    fn invoke(&self, args: CallArgs<'_>) -> Result<(), String> {
        let result = match args {
            CallArgs::None => self.function.call0(&self.this),
            CallArgs::Path(path) => self.function.call1(&self.this, &JsValue::from_str(path)),
            CallArgs::ArgList(list) => {
                let array: Array = list.iter().map(|arg| JsValue::from_str(arg)).collect();
                self.function.call1(&self.this, &array)
            }
        };
        result.map(|_| ()).map_err(describe)
    }
}

impl InitCallback for JsFunction {
    fn call(self) -> Result<(), String> {
        self.function.call0(&self.this).map(|_| ()).map_err(describe)
    }
}

impl ModuleSurface for JsModuleSurface {
    type Entry = JsFunction;
    type InitCallback = JsFunction;

    fn lookup(&self, scope: Scope, name: &str) -> Option<JsFunction> {
        self.function(scope, name)
    }

    fn init_slot(&self) -> InitSlot<JsFunction> {
        let Some(module) = self.module() else {
            return InitSlot::Absent;
        };
        let key = JsValue::from_str(INIT_SLOT);
        if !Reflect::has(&module, &key).unwrap_or(false) {
            return InitSlot::Absent;
        }
        match self.function(Scope::Module, INIT_SLOT) {
            Some(previous) => InitSlot::Occupied(previous),
            None => InitSlot::Vacant,
        }
    }

    fn set_init_callback(&self, callback: Box<dyn FnOnce()>) {
        let Some(module) = self.module() else {
            log::warn!("{} disappeared before {INIT_SLOT} could be set", self.module_name);
            return;
        };
        let hook = Closure::once_into_js(move || callback());
        if let Err(e) = Reflect::set(&module, &JsValue::from_str(INIT_SLOT), &hook) {
            log::warn!("setting {INIT_SLOT} failed: {}", describe(e));
        }
    }

    fn has_create_data_file(&self) -> bool {
        self.has_function(Scope::Module, CREATE_DATA_FILE)
    }

    fn create_data_file(
        &self,
        parent: &str,
        name: &str,
        data: &[u8],
        can_read: bool,
        can_write: bool,
    ) -> Result<(), String> {
        let create = self
            .function(Scope::Module, CREATE_DATA_FILE)
            .ok_or_else(|| format!("{CREATE_DATA_FILE} is not exported"))?;
        let args = Array::of5(
            &JsValue::from_str(parent),
            &JsValue::from_str(name),
            &Uint8Array::from(data),
            &JsValue::from_bool(can_read),
            &JsValue::from_bool(can_write),
        );
        create
            .function
            .apply(&create.this, &args)
            .map(|_| ())
            .map_err(describe)
    }

    fn unlink(&self, path: &str) -> Result<(), String> {
        let unlink = self
            .function(Scope::Module, UNLINK)
            .ok_or_else(|| format!("{UNLINK} is not exported"))?;
        unlink.invoke(CallArgs::Path(path))
    }
}

/// Best human-readable text for a thrown JS value
pub fn describe(value: JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
